//! Pooling, determinism, and thread-safety properties.

use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;

use patitas::pool::{ParserPool, RendererPool, pool_capacity};
use patitas::{Markdown, create_markdown, parse, parse_many};

#[test]
fn pool_reuse_is_bounded_by_capacity() {
    ParserPool::clear();

    // Hold more guards than the pool can keep; every extra acquire creates
    // a fresh instance, but only pool_capacity return to the shelf.
    let guards: Vec<_> = (0..pool_capacity() + 5)
        .map(|_| ParserPool::acquire())
        .collect();
    assert_eq!(ParserPool::size(), 0);
    drop(guards);
    assert_eq!(ParserPool::size(), pool_capacity());

    // Sequential acquire/release cycles never grow the pool further.
    for _ in 0..pool_capacity() * 3 {
        let _parser = ParserPool::acquire();
    }
    assert_eq!(ParserPool::size(), pool_capacity());
}

#[test]
fn pooled_renderer_is_reset_between_uses() {
    RendererPool::clear();
    let source = "# Alpha\n# Alpha\n";
    let doc = patitas::parse_to_ast(source);

    for _ in 0..4 {
        let mut renderer = RendererPool::acquire();
        let html = renderer.render(&doc, source);
        // Stale slug state would yield alpha-2/alpha-3 on reuse.
        assert!(html.contains("id=\"alpha\""));
        assert!(html.contains("id=\"alpha-1\""));
        assert_eq!(renderer.headings().len(), 2);
    }
}

#[test]
fn identical_input_across_threads_is_byte_identical() {
    let source = "# Title\n\nSome *styled* text with `code`.\n\n- a\n- b\n";
    let expected = parse(source);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let source = source.to_string();
            thread::spawn(move || parse(&source))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().expect("thread completed"), expected);
    }
}

#[test]
fn shared_markdown_instance_is_thread_safe() {
    let md = Arc::new(create_markdown());
    let source = "| a | b |\n|---|---|\n| 1 | 2 |\n\n~~x~~\n";
    let expected = md.convert(source);

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let md = Arc::clone(&md);
            let source = source.to_string();
            thread::spawn(move || md.convert(&source))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().expect("thread completed"), expected);
    }
}

#[test]
fn parse_many_equals_elementwise_sequential() {
    let sources: Vec<String> = (0..1000)
        .map(|i| match i % 4 {
            0 => format!("# Doc {i}\n\nShort paragraph {i}.\n"),
            1 => format!("- item {i}\n- item {}\n", i + 1),
            2 => format!("```\ncode {i}\n```\n"),
            _ => format!("> quote {i}\n\nAnd **text** number {i} to pad the batch out.\n"),
        })
        .collect();

    let sequential: Vec<String> = sources.iter().map(|s| parse(s)).collect();
    let parallel = parse_many(&sources);
    assert_eq!(parallel, sequential);
}

#[test]
fn ast_is_shareable_across_rendering_threads() {
    let source = "# Shared\n\nBody with *emphasis*.\n".to_string();
    let doc = Arc::new(patitas::parse_to_ast(&source));
    let source = Arc::new(source);
    let expected = patitas::render_ast(&doc, &source);

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let doc = Arc::clone(&doc);
            let source = Arc::clone(&source);
            thread::spawn(move || patitas::render_ast(&doc, &source))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().expect("thread completed"), expected);
    }
}

#[test]
fn markdown_type_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Markdown>();
    assert_send_sync::<patitas::Document>();
    assert_send_sync::<patitas::ParseConfig>();
    assert_send_sync::<patitas::RenderConfig>();
}
