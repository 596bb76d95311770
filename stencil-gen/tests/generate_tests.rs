//! End-to-end generation over real template trees.

use std::fs;
use std::path::Path;

use rstest::rstest;
use stencil_gen::{run, GenError, GenerateOptions, WriteResult};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helper
// ---------------------------------------------------------------------------

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap_or_else(|e| panic!("read {rel}: {e}"))
}

struct Fixture {
    templates: TempDir,
    out: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            templates: TempDir::new().unwrap(),
            out: TempDir::new().unwrap(),
        }
    }

    fn template(&self, rel: &str, content: &str) -> &Self {
        write(self.templates.path(), rel, content);
        self
    }

    fn options(&self) -> GenerateOptions {
        GenerateOptions {
            input_path: self.templates.path().to_path_buf(),
            output_path: self.out.path().to_path_buf(),
            ..GenerateOptions::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Directory runs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn nested_template_uses_base_context() {
    let fx = Fixture::new();
    fx.template("notes/readme.edge", "# {{ title }}");
    let ctx = fx.templates.path().join("ctx.json");
    fs::write(&ctx, r#"{"title": "Hello"}"#).unwrap();

    let mut opts = fx.options();
    opts.context_path = Some(ctx);
    opts.output_extension = "md".to_string();

    let report = run(&opts).await.unwrap();
    assert_eq!(report.templates, 1);
    assert_eq!(read(fx.out.path(), "notes/readme.md"), "# Hello");
}

#[tokio::test]
async fn local_context_overrides_base_at_every_level() {
    let fx = Fixture::new();
    fx.template("blog/post.edge", "{{ site.name }}|{{ site.lang }}|{{ tags | join(sep=\",\") }}")
        .template("blog/data.yaml", "site:\n  name: Blog\ntags: [local]\n")
        .template("home.edge", "{{ site.name }}|{{ site.lang }}");
    let base = fx.templates.path().join("base.yml");
    fs::write(&base, "site:\n  name: Main\n  lang: en\ntags: [a, b]\n").unwrap();

    let mut opts = fx.options();
    opts.context_path = Some(base);
    opts.relative_context_path = Some("data.yaml".into());

    run(&opts).await.unwrap();
    assert_eq!(read(fx.out.path(), "blog/post.html"), "Blog|en|local");
    assert_eq!(read(fx.out.path(), "home.html"), "Main|en");
}

#[tokio::test]
async fn partials_render_but_are_not_outputs() {
    let fx = Fixture::new();
    fx.template("_partials/nav.edge", "<nav>{{ title }}</nav>")
        .template("index.edge", "{% include \"_partials/nav\" %}<p>body</p>");

    let mut opts = fx.options();
    opts.context_path = Some({
        let p = fx.templates.path().join("c.json");
        fs::write(&p, r#"{"title": "T"}"#).unwrap();
        p
    });

    let report = run(&opts).await.unwrap();
    assert_eq!(report.writes.len(), 1);
    assert_eq!(read(fx.out.path(), "index.html"), "<nav>T</nav><p>body</p>");
    assert!(!fx.out.path().join("_partials").exists());
}

#[rstest]
#[case(true, "&lt;em&gt;")]
#[case(false, "<em>")]
#[tokio::test]
async fn escaping_follows_options(#[case] escape_output: bool, #[case] expected: &str) {
    let fx = Fixture::new();
    fx.template("page.edge", "{{ v }}");
    let ctx = fx.templates.path().join("c.json");
    fs::write(&ctx, r#"{"v": "<em>"}"#).unwrap();

    let mut opts = fx.options();
    opts.context_path = Some(ctx);
    opts.escape_output = escape_output;

    run(&opts).await.unwrap();
    assert_eq!(read(fx.out.path(), "page.html"), expected);
}

#[tokio::test]
async fn multi_output_template_splits_into_files() {
    let fx = Fixture::new();
    fx.template(
        "scaffold.multi.edge",
        "{% for m in modules %}<file path=\"src/{{ m }}.rs\" dedent=\"true\" trim=\"true\">\n    pub fn {{ m }}() {}\n</file>\n{% endfor %}",
    );
    let ctx = fx.templates.path().join("c.json");
    fs::write(&ctx, r#"{"modules": ["alpha", "beta"]}"#).unwrap();

    let mut opts = fx.options();
    opts.context_path = Some(ctx);

    let report = run(&opts).await.unwrap();
    assert_eq!(
        report.writes,
        vec![
            WriteResult::Written { path: fx.out.path().join("src").join("alpha.rs") },
            WriteResult::Written { path: fx.out.path().join("src").join("beta.rs") },
        ]
    );
    assert_eq!(read(fx.out.path(), "src/alpha.rs"), "pub fn alpha() {}");
    assert!(!fx.out.path().join("scaffold.multi.html").exists());
}

#[tokio::test]
async fn single_file_multi_name_is_single_output() {
    let fx = Fixture::new();
    fx.template("report.multi.edge", "<file path=\"x\">x</file>");
    let mut opts = fx.options();
    opts.input_path = fx.templates.path().join("report.multi.edge");

    run(&opts).await.unwrap();
    assert_eq!(read(fx.out.path(), "report.multi.html"), "<file path=\"x\">x</file>");
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broken_templates_are_isolated_and_listed() {
    let fx = Fixture::new();
    fx.template("a.edge", "a")
        .template("b.edge", "{% if %}")
        .template("c.edge", "c")
        .template("d.multi.edge", "plain text, no files")
        .template("e.edge", "{{ missing }}");

    let err = run(&fx.options()).await.unwrap_err();
    match &err {
        GenError::Batch { failures } => {
            let keys: Vec<_> = failures.iter().map(|f| f.key.as_str()).collect();
            assert_eq!(keys, vec!["b", "d.multi", "e"]);
        }
        other => panic!("expected batch error, got: {other}"),
    }
    assert_eq!(err.to_string(), "failed to generate: b, d.multi, e");
    assert_eq!(read(fx.out.path(), "a.html"), "a");
    assert_eq!(read(fx.out.path(), "c.html"), "c");
}

#[rstest]
#[case::missing_macro_file(&[("bad.edge", "{% import \"nope\" as m %}x")], &["bad"])]
#[case::circular_extends(&[("a.edge", "{% extends \"b\" %}"), ("b.edge", "{% extends \"a\" %}")], &["a", "b"])]
#[tokio::test]
async fn unloadable_templates_do_not_stop_the_run(
    #[case] broken: &[(&str, &str)],
    #[case] expected: &[&str],
) {
    let fx = Fixture::new();
    fx.template("good.edge", "good");
    for (rel, content) in broken {
        fx.template(rel, content);
    }

    let err = run(&fx.options()).await.unwrap_err();
    let GenError::Batch { failures } = err else { panic!("expected batch error") };
    let keys: Vec<_> = failures.iter().map(|f| f.key.as_str()).collect();
    assert_eq!(keys, expected);
    assert_eq!(read(fx.out.path(), "good.html"), "good");
}

#[tokio::test]
async fn non_utf8_partial_does_not_stop_the_run() {
    let fx = Fixture::new();
    fx.template("good.edge", "good");
    let bin = fx.templates.path().join("_p").join("bin.edge");
    fs::create_dir_all(bin.parent().unwrap()).unwrap();
    fs::write(&bin, [0xff, 0xfe, 0x00]).unwrap();

    let report = run(&fx.options()).await.unwrap();
    assert_eq!(report.templates, 1);
    assert_eq!(read(fx.out.path(), "good.html"), "good");
}

#[tokio::test]
async fn corrupt_local_context_fails_only_its_template() {
    let fx = Fixture::new();
    fx.template("one/t.edge", "one")
        .template("one/ctx.json", "{ nope")
        .template("two/t.edge", "two");

    let mut opts = fx.options();
    opts.relative_context_path = Some("ctx.json".into());

    let err = run(&opts).await.unwrap_err();
    let GenError::Batch { failures } = err else { panic!("expected batch error") };
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].key.as_str(), "one/t");
    assert!(matches!(failures[0].cause, GenError::Context(_)));
    assert_eq!(read(fx.out.path(), "two/t.html"), "two");
}

#[tokio::test]
async fn unsupported_base_context_is_fatal() {
    let fx = Fixture::new();
    fx.template("a.edge", "a");
    let ctx = fx.templates.path().join("ctx.toml");
    fs::write(&ctx, "a = 1").unwrap();

    let mut opts = fx.options();
    opts.context_path = Some(ctx);

    let err = run(&opts).await.unwrap_err();
    assert!(matches!(err, GenError::Context(_)), "got: {err}");
    assert!(!fx.out.path().join("a.html").exists());
}

#[tokio::test]
async fn empty_input_is_fatal() {
    let fx = Fixture::new();
    fx.template("readme.txt", "not a template");
    let err = run(&fx.options()).await.unwrap_err();
    assert!(matches!(err, GenError::Discover(_)), "got: {err}");
}
