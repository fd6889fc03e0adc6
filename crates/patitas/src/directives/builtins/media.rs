//! Media directives: figure, audio, gallery.

use std::sync::Arc;

use crate::ast::Directive;
use crate::builder::StringBuilder;
use crate::directives::options::{OptionsValue, RawOptions};
use crate::directives::{DirectiveHandler, DirectiveScope};
use crate::error::RenderError;
use crate::render::utils::{encode_url, escape_attr, escape_html};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FigureOptions {
    pub class_: Option<String>,
    pub align: Option<String>,
    pub width: Option<String>,
}

/// `:::{figure}` — body holds the image, the title becomes the caption.
pub struct FigureDirective;

impl DirectiveHandler for FigureDirective {
    fn names(&self) -> &'static [&'static str] {
        &["figure"]
    }

    fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
        Arc::new(FigureOptions {
            class_: raw.class().map(str::to_string),
            align: raw.string("align"),
            width: raw.string("width"),
        })
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
            .downcast::<FigureOptions>()
            .cloned()
            .unwrap_or_default();

        let mut classes = "figure".to_string();
        if let Some(align) = &opts.align {
            classes.push_str(" figure-align-");
            classes.push_str(align);
        }
        if let Some(extra) = &opts.class_ {
            classes.push(' ');
            classes.push_str(extra);
        }
        let style_attr = match &opts.width {
            Some(width) => format!(" style=\"width: {}\"", escape_attr(width)),
            None => String::new(),
        };

        out.append(&format!(
            "<figure class=\"{}\"{style_attr}>\n",
            escape_attr(&classes)
        ));
        out.append(rendered_children);
        if let Some(caption) = &node.title {
            out.append(&format!(
                "<figcaption>{}</figcaption>\n",
                escape_html(caption)
            ));
        }
        out.append("</figure>\n");
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioOptions {
    pub src: Option<String>,
    pub autoplay: bool,
    pub r#loop: bool,
}

/// `:::{audio}` with a `:src:` option.
pub struct AudioDirective;

impl DirectiveHandler for AudioDirective {
    fn names(&self) -> &'static [&'static str] {
        &["audio"]
    }

    fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
        Arc::new(AudioOptions {
            src: raw.string("src"),
            autoplay: raw.flag("autoplay"),
            r#loop: raw.flag("loop"),
        })
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
            .downcast::<AudioOptions>()
            .cloned()
            .unwrap_or_default();

        let Some(src) = &opts.src else {
            // No source: degrade to the plain body.
            out.append(rendered_children);
            return Ok(());
        };

        let mut attrs = String::from(" controls");
        if opts.autoplay {
            attrs.push_str(" autoplay");
        }
        if opts.r#loop {
            attrs.push_str(" loop");
        }

        out.append("<figure class=\"audio\">\n");
        out.append(&format!(
            "<audio src=\"{}\"{attrs}></audio>\n",
            encode_url(src)
        ));
        if let Some(caption) = &node.title {
            out.append(&format!(
                "<figcaption>{}</figcaption>\n",
                escape_html(caption)
            ));
        }
        out.append("</figure>\n");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GalleryOptions {
    pub class_: Option<String>,
    pub columns: u8,
}

impl Default for GalleryOptions {
    fn default() -> Self {
        Self {
            class_: None,
            columns: 3,
        }
    }
}

/// `:::{gallery}` — an image grid.
pub struct GalleryDirective;

impl DirectiveHandler for GalleryDirective {
    fn names(&self) -> &'static [&'static str] {
        &["gallery"]
    }

    fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
        Arc::new(GalleryOptions {
            class_: raw.class().map(str::to_string),
            columns: raw.int("columns").map(|n| n.clamp(1, 8) as u8).unwrap_or(3),
        })
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
            .downcast::<GalleryOptions>()
            .cloned()
            .unwrap_or_default();

        let mut classes = format!("gallery gallery-columns-{}", opts.columns);
        if let Some(extra) = &opts.class_ {
            classes.push(' ');
            classes.push_str(extra);
        }
        out.append(&format!("<div class=\"{}\">\n", escape_attr(&classes)));
        out.append(rendered_children);
        out.append("</div>\n");
        Ok(())
    }
}
