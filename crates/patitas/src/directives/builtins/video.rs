//! Video embeds: youtube, vimeo, tiktok, and self-hosted `video`.
//!
//! The hosted variants take the video id as the directive title:
//! `:::{youtube} dQw4w9WgXcQ`.

use std::sync::Arc;

use crate::ast::Directive;
use crate::builder::StringBuilder;
use crate::directives::options::{OptionsValue, RawOptions};
use crate::directives::{DirectiveHandler, DirectiveScope};
use crate::error::RenderError;
use crate::render::utils::{encode_url, escape_attr};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbedVideoOptions {
    pub width: Option<String>,
    pub title: Option<String>,
    pub start: Option<u64>,
}

fn embed_options(raw: &RawOptions) -> EmbedVideoOptions {
    EmbedVideoOptions {
        width: raw.string("width"),
        title: raw.string("title"),
        start: raw.int("start").map(|n| n.max(0) as u64),
    }
}

fn render_iframe(
    provider: &str,
    src: &str,
    opts: &EmbedVideoOptions,
    out: &mut StringBuilder,
) {
    let style_attr = match &opts.width {
        Some(width) => format!(" style=\"max-width: {}\"", escape_attr(width)),
        None => String::new(),
    };
    let title_attr = escape_attr(opts.title.as_deref().unwrap_or(provider)).into_owned();

    out.append(&format!(
        "<div class=\"video-embed video-{provider}\"{style_attr}>\n"
    ));
    out.append(&format!(
        "<iframe src=\"{src}\" title=\"{title_attr}\" loading=\"lazy\" allowfullscreen></iframe>\n"
    ));
    out.append("</div>\n");
}

macro_rules! hosted_video {
    ($handler:ident, $name:literal, $url:expr) => {
        pub struct $handler;

        impl DirectiveHandler for $handler {
            fn names(&self) -> &'static [&'static str] {
                &[$name]
            }

            fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
                Arc::new(embed_options(raw))
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
                    .downcast::<EmbedVideoOptions>()
                    .cloned()
                    .unwrap_or_default();
                let Some(id) = node.title.as_deref().map(str::trim).filter(|id| !id.is_empty())
                else {
                    out.append(rendered_children);
                    return Ok(());
                };
                let build_src: fn(&str, &EmbedVideoOptions) -> String = $url;
                let src = build_src(id, &opts);
                render_iframe($name, &src, &opts, out);
                Ok(())
            }
        }
    };
}

hosted_video!(YouTubeDirective, "youtube", |id, opts| {
    match opts.start {
        Some(start) if start > 0 => format!(
            "https://www.youtube-nocookie.com/embed/{}?start={start}",
            encode_url(id)
        ),
        _ => format!("https://www.youtube-nocookie.com/embed/{}", encode_url(id)),
    }
});

hosted_video!(VimeoDirective, "vimeo", |id, _opts| {
    format!("https://player.vimeo.com/video/{}", encode_url(id))
});

hosted_video!(TikTokDirective, "tiktok", |id, _opts| {
    format!("https://www.tiktok.com/embed/v2/{}", encode_url(id))
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelfHostedVideoOptions {
    pub src: Option<String>,
    pub poster: Option<String>,
    pub autoplay: bool,
    pub muted: bool,
    pub r#loop: bool,
}

/// `:::{video}` with a `:src:` option pointing at a hosted file.
pub struct SelfHostedVideoDirective;

impl DirectiveHandler for SelfHostedVideoDirective {
    fn names(&self) -> &'static [&'static str] {
        &["video"]
    }

    fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
        Arc::new(SelfHostedVideoOptions {
            src: raw.string("src"),
            poster: raw.string("poster"),
            autoplay: raw.flag("autoplay"),
            muted: raw.flag("muted"),
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
            .downcast::<SelfHostedVideoOptions>()
            .cloned()
            .unwrap_or_default();

        let Some(src) = &opts.src else {
            out.append(rendered_children);
            return Ok(());
        };

        let mut attrs = String::from(" controls");
        if let Some(poster) = &opts.poster {
            attrs.push_str(&format!(" poster=\"{}\"", encode_url(poster)));
        }
        if opts.autoplay {
            attrs.push_str(" autoplay");
        }
        if opts.muted {
            attrs.push_str(" muted");
        }
        if opts.r#loop {
            attrs.push_str(" loop");
        }

        out.append("<div class=\"video-embed video-self-hosted\">\n");
        out.append(&format!("<video src=\"{}\"{attrs}></video>\n", encode_url(src)));
        out.append("</div>\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::api::create_markdown;

    #[test]
    fn youtube_embed_from_title() {
        let md = create_markdown();
        let html = md.convert(":::{youtube} dQw4w9WgXcQ\n:::\n");
        assert!(html.contains("video-youtube"));
        assert!(html.contains("https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ"));
    }

    #[test]
    fn youtube_start_offset() {
        let md = create_markdown();
        let html = md.convert(":::{youtube} abc123\n:start: 42\n:::\n");
        assert!(html.contains("embed/abc123?start=42"));
    }

    #[test]
    fn self_hosted_video() {
        let md = create_markdown();
        let html = md.convert(":::{video}\n:src: /clip.mp4\n:muted:\n:::\n");
        assert!(html.contains("<video src=\"/clip.mp4\" controls muted></video>"));
    }
}
