//! Include directives against a real filesystem resolver.
//!
//! The core never touches the disk itself; these tests supply the kind of
//! [`FileResolver`] a host would, rooted in a temp directory, and drive
//! `include` / `literalinclude` end-to-end: content is read, parsed, and
//! rendered, and the resolver's security policy (path containment, symlink
//! refusal, size limit, cycle detection) surfaces as inline error nodes.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::tempdir;

use patitas::error::IncludeError;
use patitas::protocols::{FileResolver, ResolvedInclude};
use patitas::{RenderEnv, create_markdown};

/// A host resolver rooted at a site directory: containment under the root,
/// no symlinks, no self-inclusion, bounded size.
struct SiteResolver {
    root: PathBuf,
}

impl SiteResolver {
    fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

impl FileResolver for SiteResolver {
    fn resolve(
        &self,
        path: &str,
        current_file: Option<&Path>,
        _max_depth: usize,
        size_limit: usize,
    ) -> Result<ResolvedInclude, IncludeError> {
        let candidate = self.root.join(path);

        let is_symlink = candidate
            .symlink_metadata()
            .map(|meta| meta.file_type().is_symlink())
            .unwrap_or(false);
        if is_symlink {
            return Err(IncludeError::Symlink(path.to_string()));
        }

        let absolute_path = candidate
            .canonicalize()
            .map_err(|_| IncludeError::NotFound(path.to_string()))?;
        let root = self
            .root
            .canonicalize()
            .map_err(|error| IncludeError::Io(error.to_string()))?;
        if !absolute_path.starts_with(&root) {
            return Err(IncludeError::OutsideRoot(path.to_string()));
        }
        if current_file == Some(absolute_path.as_path()) {
            return Err(IncludeError::Cycle(path.to_string()));
        }

        let content =
            fs::read_to_string(&absolute_path).map_err(|error| IncludeError::Io(error.to_string()))?;
        if content.len() > size_limit {
            return Err(IncludeError::TooLarge {
                size: content.len(),
                limit: size_limit,
            });
        }

        Ok(ResolvedInclude {
            content,
            absolute_path,
        })
    }
}

#[test]
fn include_renders_markdown_from_disk() {
    let site = tempdir().expect("temp site root");
    fs::write(
        site.path().join("snippet.md"),
        "# From Disk\n\nBody written to a real file.\n",
    )
    .expect("write snippet");

    let resolver = SiteResolver::new(site.path());
    let env = RenderEnv {
        file_resolver: Some(&resolver),
        ..RenderEnv::empty()
    };
    let html = create_markdown().convert_with(":::{include} snippet.md\n:::\n", None, &env);

    assert!(html.contains("<h1 id=\"from-disk\">From Disk</h1>"));
    assert!(html.contains("<p>Body written to a real file.</p>"));
}

#[test]
fn literalinclude_renders_code_from_disk() {
    let site = tempdir().expect("temp site root");
    fs::write(site.path().join("main.rs"), "fn main() {\n    run();\n}\n").expect("write source");

    let resolver = SiteResolver::new(site.path());
    let env = RenderEnv {
        file_resolver: Some(&resolver),
        ..RenderEnv::empty()
    };
    let html = create_markdown().convert_with(":::{literalinclude} main.rs\n:::\n", None, &env);

    assert!(html.contains("<pre><code class=\"language-rs\">fn main() {\n    run();\n}\n</code></pre>"));
}

#[test]
fn literalinclude_line_slicing_from_disk() {
    let site = tempdir().expect("temp site root");
    fs::write(site.path().join("lines.txt"), "one\ntwo\nthree\nfour\n").expect("write lines");

    let resolver = SiteResolver::new(site.path());
    let env = RenderEnv {
        file_resolver: Some(&resolver),
        ..RenderEnv::empty()
    };
    let html = create_markdown().convert_with(
        ":::{literalinclude} lines.txt\n:start-line: 2\n:end-line: 3\n:::\n",
        None,
        &env,
    );

    assert!(html.contains(">two\nthree\n</code></pre>"));
    assert!(!html.contains("one"));
    assert!(!html.contains("four"));
}

#[test]
fn path_outside_root_renders_error_node() {
    let outer = tempdir().expect("temp outer dir");
    let site = outer.path().join("site");
    fs::create_dir(&site).expect("site dir");
    fs::write(outer.path().join("secret.md"), "do not include\n").expect("write secret");

    let resolver = SiteResolver::new(&site);
    let env = RenderEnv {
        file_resolver: Some(&resolver),
        ..RenderEnv::empty()
    };
    let html = create_markdown().convert_with(":::{include} ../secret.md\n:::\n", None, &env);

    assert!(html.contains("include-error"));
    assert!(html.contains("escapes the content root"));
    assert!(!html.contains("do not include"));
}

#[test]
fn missing_file_renders_error_node() {
    let site = tempdir().expect("temp site root");
    let resolver = SiteResolver::new(site.path());
    let env = RenderEnv {
        file_resolver: Some(&resolver),
        ..RenderEnv::empty()
    };
    let html = create_markdown().convert_with(":::{include} nowhere.md\n:::\n", None, &env);

    assert!(html.contains("include-error"));
    assert!(html.contains("file not found"));
}

#[test]
fn resolver_enforces_size_limit() {
    let site = tempdir().expect("temp site root");
    fs::write(site.path().join("big.md"), "x".repeat(64)).expect("write big file");

    let resolver = SiteResolver::new(site.path());
    let result = resolver.resolve("big.md", None, 10, 16);
    assert!(matches!(result, Err(IncludeError::TooLarge { size: 64, limit: 16 })));
}

#[test]
fn resolver_detects_self_inclusion() {
    let site = tempdir().expect("temp site root");
    fs::write(site.path().join("page.md"), "content\n").expect("write page");

    let resolver = SiteResolver::new(site.path());
    let current = site
        .path()
        .join("page.md")
        .canonicalize()
        .expect("canonical page path");
    let result = resolver.resolve("page.md", Some(&current), 10, 1024);
    assert!(matches!(result, Err(IncludeError::Cycle(_))));
}

#[cfg(unix)]
#[test]
fn symlink_is_rejected() {
    let site = tempdir().expect("temp site root");
    fs::write(site.path().join("real.md"), "real content\n").expect("write target");
    std::os::unix::fs::symlink(site.path().join("real.md"), site.path().join("alias.md"))
        .expect("create symlink");

    let resolver = SiteResolver::new(site.path());
    let env = RenderEnv {
        file_resolver: Some(&resolver),
        ..RenderEnv::empty()
    };
    let html = create_markdown().convert_with(":::{include} alias.md\n:::\n", None, &env);

    assert!(html.contains("include-error"));
    assert!(html.contains("symlinks are not followed"));
    assert!(!html.contains("real content"));
}
