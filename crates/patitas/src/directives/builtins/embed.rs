//! Third-party embeds: gist, codepen, codesandbox, stackblitz, spotify,
//! soundcloud. Each takes its identifier as the directive title and renders
//! a provider-specific embed shell.

use std::sync::Arc;

use crate::ast::Directive;
use crate::builder::StringBuilder;
use crate::directives::options::{OptionsValue, RawOptions, StyledOptions};
use crate::directives::{DirectiveHandler, DirectiveScope};
use crate::error::RenderError;
use crate::render::utils::{encode_url, escape_attr};

fn title_id<'a>(node: &'a Directive) -> Option<&'a str> {
    node.title.as_deref().map(str::trim).filter(|id| !id.is_empty())
}

macro_rules! embed_directive {
    ($handler:ident, $name:literal, $render:expr) => {
        pub struct $handler;

        impl DirectiveHandler for $handler {
            fn names(&self) -> &'static [&'static str] {
                &[$name]
            }

            fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
                Arc::new(StyledOptions::from_raw(raw))
            }

            fn render(
                &self,
                node: &Directive,
                rendered_children: &str,
                out: &mut StringBuilder,
                _scope: &mut DirectiveScope<'_, '_>,
            ) -> Result<(), RenderError> {
                let Some(id) = title_id(node) else {
                    out.append(rendered_children);
                    return Ok(());
                };
                let render_embed: fn(&str, &mut StringBuilder) = $render;
                out.append(&format!("<div class=\"embed embed-{}\">\n", $name));
                render_embed(id, out);
                out.append("</div>\n");
                Ok(())
            }
        }
    };
}

embed_directive!(GistDirective, "gist", |id, out| {
    out.append(&format!(
        "<script src=\"https://gist.github.com/{}.js\"></script>\n",
        encode_url(id)
    ));
});

embed_directive!(CodePenDirective, "codepen", |id, out| {
    // id is `user/pen-hash`.
    let (user, pen) = id.split_once('/').unwrap_or(("", id));
    out.append(&format!(
        "<iframe src=\"https://codepen.io/{}/embed/{}\" loading=\"lazy\" allowfullscreen></iframe>\n",
        encode_url(user),
        encode_url(pen)
    ));
});

embed_directive!(CodeSandboxDirective, "codesandbox", |id, out| {
    out.append(&format!(
        "<iframe src=\"https://codesandbox.io/embed/{}\" loading=\"lazy\" allowfullscreen></iframe>\n",
        encode_url(id)
    ));
});

embed_directive!(StackBlitzDirective, "stackblitz", |id, out| {
    out.append(&format!(
        "<iframe src=\"https://stackblitz.com/edit/{}?embed=1\" loading=\"lazy\" allowfullscreen></iframe>\n",
        encode_url(id)
    ));
});

embed_directive!(SpotifyDirective, "spotify", |id, out| {
    // id is `track/…`, `album/…`, or `playlist/…`.
    out.append(&format!(
        "<iframe src=\"https://open.spotify.com/embed/{}\" loading=\"lazy\" allow=\"encrypted-media\"></iframe>\n",
        encode_url(id)
    ));
});

embed_directive!(SoundCloudDirective, "soundcloud", |id, out| {
    out.append(&format!(
        "<iframe src=\"https://w.soundcloud.com/player/?url={}\" loading=\"lazy\"></iframe>\n",
        escape_attr(&encode_url(id))
    ));
});

#[cfg(test)]
mod tests {
    use crate::api::create_markdown;

    #[test]
    fn gist_embed() {
        let md = create_markdown();
        let html = md.convert(":::{gist} octocat/abc123\n:::\n");
        assert!(html.contains("embed-gist"));
        assert!(html.contains("https://gist.github.com/octocat/abc123.js"));
    }

    #[test]
    fn codepen_splits_user_and_pen() {
        let md = create_markdown();
        let html = md.convert(":::{codepen} someone/xyzzy\n:::\n");
        assert!(html.contains("https://codepen.io/someone/embed/xyzzy"));
    }

    #[test]
    fn missing_id_degrades_to_body() {
        let md = create_markdown();
        let html = md.convert(":::{spotify}\nNo id given.\n:::\n");
        assert!(html.contains("No id given."));
        assert!(!html.contains("<iframe"));
    }
}
