//! End-to-end pipeline scenarios: the typed AST, zero-copy handoff, heading
//! decoration, directives with typed options, elevation, metadata
//! accumulation, and error propagation modes.

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;

use patitas::ast::{Block, CodeBody};
use patitas::config::{ParseConfig, parse_config};
use patitas::directives::builtins::AdmonitionOptions;
use patitas::metadata::metadata;
use patitas::render_config::{RenderConfig, render_config};
use patitas::{
    HeadingInfo, HtmlRenderer, Parser, RenderError, RequestContext, TextTransform,
    create_markdown,
};

#[test]
fn basic_parse_scenario() {
    let source = "# Hello **World**\n";
    let doc = Parser::new().parse_with(source, &ParseConfig::default());
    let mut renderer = HtmlRenderer::new();
    let html = renderer.render(&doc, source);

    assert_eq!(html, "<h1 id=\"hello-world\">Hello <strong>World</strong></h1>\n");
    assert_eq!(
        renderer.headings(),
        &[HeadingInfo {
            level: 1,
            text: "Hello World".to_string(),
            slug: "hello-world".to_string(),
        }]
    );
}

#[test]
fn zclh_span_preserves_source_bytes() {
    let source = "```python\ndef f():\n    return 1\nprint(f())\n```\n";
    let doc = Parser::new().parse_with(source, &ParseConfig::default());

    let Block::FencedCode(code) = &doc.children[0] else {
        panic!("expected fenced code")
    };
    let CodeBody::Span(span) = &code.body else {
        panic!("expected span-backed body")
    };
    assert_eq!(
        &source[span.start..span.end],
        "def f():\n    return 1\nprint(f())\n"
    );

    let html = HtmlRenderer::new().render(&doc, source);
    assert_eq!(
        html,
        "<pre><code class=\"language-python\">def f():\n    return 1\nprint(f())\n</code></pre>\n"
    );
}

#[test]
fn duplicate_heading_slugs() {
    let source = "# Setup\n# Setup\n# Setup\n";
    let doc = Parser::new().parse_with(source, &ParseConfig::default());
    let mut renderer = HtmlRenderer::new();
    let html = renderer.render(&doc, source);

    for id in ["id=\"setup\"", "id=\"setup-1\"", "id=\"setup-2\""] {
        assert!(html.contains(id), "missing {id}");
    }
    let toc = renderer.toc_html();
    for target in ["#setup", "#setup-1", "#setup-2"] {
        assert!(toc.contains(&format!("href=\"{target}\"")));
    }
}

#[test]
fn tight_vs_loose_list_scenario() {
    assert_eq!(
        patitas::parse("- a\n- b\n"),
        "<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n"
    );
    assert_eq!(
        patitas::parse("- a\n\n- b\n"),
        "<ul>\n<li>\n<p>a</p>\n</li>\n<li>\n<p>b</p>\n</li>\n</ul>\n"
    );
}

#[test]
fn directive_with_typed_options_scenario() {
    let registry = patitas::directives::create_default_registry();
    let config = ParseConfig {
        directive_registry: Some(registry),
        ..ParseConfig::default()
    };
    let source = ":::{note}\n:class: custom\n:name: my-note\n\nBody.\n:::\n";
    let doc = Parser::new().parse_with(source, &config);

    assert_eq!(doc.children.len(), 1);
    let Block::Directive(directive) = &doc.children[0] else {
        panic!("expected directive")
    };
    assert_eq!(directive.name, "note");
    let options = directive
        .options
        .downcast::<AdmonitionOptions>()
        .expect("typed options");
    assert_eq!(options.class_.as_deref(), Some("custom"));
    assert_eq!(options.name.as_deref(), Some("my-note"));
    assert_eq!(directive.children.len(), 1);
    assert!(matches!(directive.children[0], Block::Paragraph(_)));
}

#[test]
fn text_transformer_elevation_scenario() {
    let transformer: TextTransform =
        Arc::new(|line: &str| line.replace("{{heading}}", "# Elevated"));
    let html = patitas::parse_with_context("{{heading}}\n", transformer);
    assert_eq!(html, "<h1 id=\"elevated\">Elevated</h1>\n");
}

#[test]
fn multi_line_elevation_degrades_to_paragraph() {
    let transformer: TextTransform =
        Arc::new(|line: &str| line.replace("{{items}}", "- one\n- two"));
    let html = patitas::parse_with_context("{{items}}\n", transformer);
    assert!(html.starts_with("<p>"));
    assert!(!html.contains("<ul>"));
}

#[test]
fn gfm_extensions_through_markdown_instance() {
    let md = create_markdown();

    let table = md.convert("| a | b |\n|---|---|\n| 1 | 2 |\n");
    assert!(table.contains("<div class=\"table-wrapper\"><table>"));
    assert!(table.contains("<th>a</th>"));
    assert!(table.contains("<td>2</td>"));

    let strike = md.convert("~~old~~ new\n");
    assert!(strike.contains("<del>old</del>"));

    let tasks = md.convert("- [x] done\n- [ ] todo\n");
    assert!(tasks.contains("task-list-item-checkbox"));

    let math = md.convert("Inline $x^2$ and\n\n$$\ny = mx\n$$\n");
    assert!(math.contains("<span class=\"math\">x^2</span>"));
    assert!(math.contains("<div class=\"math-block\">\ny = mx\n</div>"));

    let autolink = md.convert("see https://example.com/page now\n");
    assert!(autolink.contains("<a href=\"https://example.com/page\">"));

    let footnotes = md.convert("claim[^a]\n\n[^a]: proof\n");
    assert!(footnotes.contains("<section class=\"footnotes\">"));
}

#[test]
fn metadata_accumulates_in_document_order() {
    let md = create_markdown();
    let source = "\
# Title

Some words here with [internal](/docs/) and [external](https://example.com/) links.

![figure](/img.png)

```rust
fn main() {}
```

```mermaid
graph TD;
```

| a |
|---|
| 1 |

Math: $x$
";
    let ((), meta) = metadata::collect(|| {
        md.convert(source);
    });

    assert!(meta.has_code_blocks);
    assert!(meta.has_mermaid);
    assert!(meta.has_tables);
    assert!(meta.has_math);
    assert!(meta.code_languages.contains("rust"));
    assert_eq!(meta.internal_links, vec!["/docs/".to_string()]);
    assert_eq!(meta.external_links, vec!["https://example.com/".to_string()]);
    assert_eq!(meta.image_refs, vec!["/img.png".to_string()]);
    assert!(meta.word_count > 5);
}

#[test]
fn reporting_mode_collects_contract_violations() {
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let ctx = RequestContext {
        error_handler: Some(Arc::new(move |error: &RenderError, where_: &str| {
            sink.lock().unwrap().push(format!("{where_}: {error}"));
        })),
        ..RequestContext::default()
    };

    let md = create_markdown();
    patitas::with_request_context(ctx, || {
        md.convert(":::{tab-item} Orphan\nBody.\n:::\n");
    });

    let reports = seen.lock().unwrap();
    assert!(!reports.is_empty());
    assert!(reports[0].contains("tab-item"));
}

#[test]
fn strict_mode_fails_on_contract_violation() {
    let md = create_markdown().strict_contracts(true);
    let result = md.try_convert(
        ":::{tab-item} Orphan\nBody.\n:::\n",
        &patitas::RenderEnv::empty(),
    );
    assert!(matches!(result, Err(RenderError::Contract(_))));
}

#[test]
fn best_effort_mode_always_produces_html() {
    let md = create_markdown();
    let html = md.convert(":::{tab-item} Orphan\nBody.\n:::\n");
    assert!(html.contains("Body."));
}

#[test]
fn renderer_never_reparses_rendered_html() {
    // Removing the post-render phase must not change output: rendering and
    // TOC generation read only the AST and the heading log.
    let source = "# A `<code>` heading\n\ntext with <h1>fake</h1> markup\n";
    let doc = patitas::parse_to_ast(source);
    let first = patitas::render_ast(&doc, source);
    let second = patitas::render_ast(&doc, source);
    assert_eq!(first, second);
}

#[test]
fn fuzzed_ascii_soup_never_panics() {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    for round in 0..24 {
        let mut source = String::new();
        for _ in 0..2048 {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(round);
            let byte = (state >> 33) as u8;
            match byte % 24 {
                0 => source.push('\n'),
                1 => source.push_str("```"),
                2 => source.push_str(":::"),
                3 => source.push_str("{note}"),
                4 => source.push('*'),
                5 => source.push('['),
                6 => source.push(']'),
                7 => source.push('('),
                8 => source.push('#'),
                9 => source.push('>'),
                10 => source.push('`'),
                11 => source.push('|'),
                12 => source.push('$'),
                13 => source.push('<'),
                14 => source.push('&'),
                15 => source.push('\\'),
                _ => source.push((b'a' + byte % 26) as char),
            }
        }
        // Completing without panicking is the property under test.
        let html = patitas::parse(&source);
        drop(html);
    }
}

#[test]
fn ambient_config_scopes_nest() {
    let outer = ParseConfig {
        tables: true,
        ..ParseConfig::default()
    };
    parse_config::with(outer, || {
        assert!(parse_config::get().tables);
        let inner = ParseConfig::default();
        parse_config::with(inner, || {
            assert!(!parse_config::get().tables);
        });
        assert!(parse_config::get().tables);
    });
    assert!(!parse_config::get().tables);

    render_config::with(
        RenderConfig {
            highlight: true,
            ..RenderConfig::default()
        },
        || assert!(render_config::get().highlight),
    );
    assert!(!render_config::get().highlight);
}
