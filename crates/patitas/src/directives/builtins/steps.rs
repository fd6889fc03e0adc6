//! Step-by-step guide directives.
//!
//! `steps` contains `step` children (contract-enforced). Step numbers are
//! injected at parse time: the container rebuilds each child step with
//! options carrying its number and heading level, so rendering needs no
//! parent back-reference and the AST stays immutable.

use std::sync::Arc;

use crate::ast::{Block, Directive, DirectiveOptions};
use crate::builder::StringBuilder;
use crate::directives::contracts::{DirectiveContract, STEP_CONTRACT, STEPS_CONTRACT};
use crate::directives::options::{OptionsValue, RawOptions};
use crate::directives::{DirectiveHandler, DirectiveScope};
use crate::error::RenderError;
use crate::render::utils::{default_slugify, escape_attr, escape_html};
use patitas_syntax::SourceLocation;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOptions {
    pub class_: Option<String>,
    pub description: Option<String>,
    pub optional: bool,
    pub duration: Option<String>,
    /// Injected by the parent steps container at parse time.
    pub step_number: Option<u64>,
    /// Injected by the parent steps container at parse time.
    pub heading_level: Option<u8>,
}

impl StepOptions {
    fn from_raw(raw: &RawOptions) -> Self {
        Self {
            class_: raw.class().map(str::to_string),
            description: raw.string("description"),
            optional: raw.flag("optional"),
            duration: raw.string("duration"),
            step_number: None,
            heading_level: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepsOptions {
    pub class_: Option<String>,
    pub style: Option<String>,
    pub start: u64,
}

impl Default for StepsOptions {
    fn default() -> Self {
        Self {
            class_: None,
            style: None,
            start: 1,
        }
    }
}

pub struct StepDirective;

impl StepDirective {
    fn step_id(title: &str) -> String {
        let slug = default_slugify(title);
        if slug.is_empty() { "step".to_string() } else { slug }
    }
}

impl DirectiveHandler for StepDirective {
    fn names(&self) -> &'static [&'static str] {
        &["step"]
    }

    fn contract(&self) -> Option<&DirectiveContract> {
        Some(&STEP_CONTRACT)
    }

    fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
        Arc::new(StepOptions::from_raw(raw))
    }

    fn render(
        &self,
        node: &Directive,
        rendered_children: &str,
        out: &mut StringBuilder,
        _scope: &mut DirectiveScope<'_, '_>,
    ) -> Result<(), RenderError> {
        let opts = node
            .options
            .downcast::<StepOptions>()
            .cloned()
            .unwrap_or_else(|| StepOptions::from_raw(&node.options.raw));

        let step_number = opts.step_number.unwrap_or(1);
        let heading_level = opts.heading_level.unwrap_or(2);
        let title = node.title.as_deref().unwrap_or("");
        let step_id = if title.is_empty() {
            format!("step-{step_number}")
        } else {
            Self::step_id(title)
        };

        let mut classes = Vec::new();
        if let Some(extra) = &opts.class_ {
            classes.push(extra.as_str());
        }
        if opts.optional {
            classes.push("step-optional");
        }
        let class_attr = if classes.is_empty() {
            String::new()
        } else {
            format!(" class=\"{}\"", escape_attr(&classes.join(" ")))
        };

        out.append(&format!(
            "<li{class_attr} id=\"{}\">",
            escape_attr(&step_id)
        ));
        out.append(&format!(
            "<a class=\"step-marker\" href=\"#{}\" aria-label=\"Step {step_number}\">{step_number}</a>",
            escape_attr(&step_id)
        ));

        if !title.is_empty() {
            out.append(&format!(
                "<h{heading_level} class=\"step-title\">{}</h{heading_level}>",
                escape_html(title)
            ));
        }

        let mut badges = Vec::new();
        if opts.optional {
            badges.push("<span class=\"step-badge step-badge-optional\">Optional</span>".to_string());
        }
        if let Some(duration) = opts.duration.as_deref().filter(|d| !d.is_empty()) {
            badges.push(format!(
                "<span class=\"step-duration\">{}</span>",
                escape_html(duration)
            ));
        }
        if !badges.is_empty() {
            out.append(&format!(
                "<div class=\"step-metadata\">{}</div>\n",
                badges.join(" ")
            ));
        }

        if let Some(description) = opts.description.as_deref().filter(|d| !d.is_empty()) {
            out.append(&format!(
                "<p class=\"step-description\">{}</p>\n",
                escape_html(description)
            ));
        }

        out.append(rendered_children);
        out.append("</li>\n");
        Ok(())
    }
}

pub struct StepsDirective;

impl DirectiveHandler for StepsDirective {
    fn names(&self) -> &'static [&'static str] {
        &["steps"]
    }

    fn contract(&self) -> Option<&DirectiveContract> {
        Some(&STEPS_CONTRACT)
    }

    fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
        Arc::new(StepsOptions {
            class_: raw.class().map(str::to_string),
            style: raw.string("style"),
            start: raw.int("start").map(|n| n.max(1) as u64).unwrap_or(1),
        })
    }

    /// Rebuild child steps with their numbers and heading level injected.
    fn parse(
        &self,
        name: &str,
        title: Option<&str>,
        options: DirectiveOptions,
        children: Vec<Block>,
        location: SourceLocation,
    ) -> Directive {
        let start = options
            .downcast::<StepsOptions>()
            .map(|opts| opts.start)
            .unwrap_or(1);
        let heading_level = 2u8;

        let mut step_number = start;
        let children = children
            .into_iter()
            .map(|child| match child {
                Block::Directive(step) if step.name == "step" => {
                    let mut opts = step
                        .options
                        .downcast::<StepOptions>()
                        .cloned()
                        .unwrap_or_else(|| StepOptions::from_raw(&step.options.raw));
                    opts.step_number = Some(step_number);
                    opts.heading_level = Some(heading_level);
                    step_number += 1;

                    Block::Directive(Directive {
                        location: step.location,
                        name: step.name,
                        title: step.title,
                        options: DirectiveOptions::with_typed(
                            step.options.raw.clone(),
                            Arc::new(opts),
                        ),
                        children: step.children,
                    })
                }
                other => other,
            })
            .collect();

        Directive {
            location,
            name: name.to_string(),
            title: title.map(str::to_string),
            options,
            children,
        }
    }

    fn render(
        &self,
        node: &Directive,
        rendered_children: &str,
        out: &mut StringBuilder,
        _scope: &mut DirectiveScope<'_, '_>,
    ) -> Result<(), RenderError> {
        let opts = node
            .options
            .downcast::<StepsOptions>()
            .cloned()
            .unwrap_or_default();

        let mut classes = vec!["steps".to_string()];
        if let Some(extra) = &opts.class_ {
            classes.push(extra.clone());
        }
        if let Some(style) = opts.style.as_deref().filter(|s| *s != "default") {
            classes.push(format!("steps-{style}"));
        }
        let class_str = classes.join(" ");

        let has_items = rendered_children.contains("<li>") || rendered_children.contains("<li ");
        if !has_items {
            out.append(&format!("<div class=\"{}\">\n", escape_attr(&class_str)));
            out.append(rendered_children);
            out.append("</div>\n");
            return Ok(());
        }

        let style_attr = if opts.start != 1 {
            format!(" style=\"counter-reset: step {}\"", opts.start - 1)
        } else {
            String::new()
        };
        let start_attr = if opts.start != 1 {
            format!(" start=\"{}\"", opts.start)
        } else {
            String::new()
        };

        out.append(&format!(
            "<div class=\"{}\"{style_attr}>\n",
            escape_attr(&class_str)
        ));
        out.append(&format!("<ol{start_attr}>\n"));
        out.append(rendered_children);
        out.append("</ol>\n</div>\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::create_markdown;
    use crate::config::ParseConfig;
    use crate::parser::Parser;

    #[test]
    fn step_numbers_are_injected_in_order() {
        let config = ParseConfig {
            directive_registry: Some(crate::directives::create_default_registry()),
            ..ParseConfig::default()
        };
        let doc = Parser::new().parse_with(
            "::::{steps}\n\n:::{step} First\nA.\n:::\n\n:::{step} Second\nB.\n:::\n\n::::\n",
            &config,
        );
        let crate::ast::Block::Directive(steps) = &doc.children[0] else {
            panic!()
        };
        let numbers: Vec<u64> = steps
            .children
            .iter()
            .filter_map(|child| match child {
                crate::ast::Block::Directive(step) => step
                    .options
                    .downcast::<StepOptions>()
                    .and_then(|opts| opts.step_number),
                _ => None,
            })
            .collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn steps_render_ordered_list_with_markers() {
        let md = create_markdown();
        let html = md.convert(
            "::::{steps}\n\n:::{step} Install\nRun the installer.\n:::\n\n:::{step} Verify\n:optional:\n\nCheck it.\n:::\n\n::::\n",
        );
        assert!(html.contains("<div class=\"steps\">"));
        assert!(html.contains("<ol>"));
        assert!(html.contains("aria-label=\"Step 1\""));
        assert!(html.contains("aria-label=\"Step 2\""));
        assert!(html.contains("step-badge-optional"));
        assert!(html.contains("<h2 class=\"step-title\">Install</h2>"));
    }

    #[test]
    fn custom_start_offsets_numbering() {
        let md = create_markdown();
        let html = md.convert("::::{steps}\n:start: 3\n\n:::{step} Resume\nGo.\n:::\n\n::::\n");
        assert!(html.contains("counter-reset: step 2"));
        assert!(html.contains("<ol start=\"3\">"));
        assert!(html.contains("aria-label=\"Step 3\""));
    }
}
