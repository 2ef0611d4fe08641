use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_vuexdoc"));
    // fixture source paths are relative to the crate root
    command.current_dir(env!("CARGO_MANIFEST_DIR"));
    assert_cmd::Command::from(command)
}

fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn read(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name))
        .unwrap_or_else(|e| panic!("failed to read {}: {}", name, e))
}

fn publish(dir: &TempDir, extra: &[&str]) {
    cmd()
        .args(["-d", dir.path().to_str().unwrap()])
        .args(extra)
        .arg(fixture_path("bookstore.json"))
        .assert()
        .success();
}

// -- site layout --

#[test]
fn writes_one_page_per_entity() {
    let dir = TempDir::new().unwrap();
    publish(&dir, &[]);

    for page in [
        "index.html",
        "global.html",
        "store-Bookstore.html",
        "component-BookList.html",
        "model-Book.html",
        "Cart.html",
        "cart_.html",
        "bookstore-module.js.html",
        "components_BookList.vue.html",
        "search-index.json",
        "styles/vuexdoc.css",
        "scripts/vuexdoc.js",
    ] {
        assert!(dir.path().join(page).is_file(), "missing {}", page);
    }

    assert!(read(dir.path(), "store-Bookstore.html").contains("<title>vuexdoc: Store: Bookstore</title>"));
    assert!(read(dir.path(), "component-BookList.html").contains("Component: BookList"));
    assert!(read(dir.path(), "model-Book.html").contains("Model: Book"));
    assert!(read(dir.path(), "Cart.html").contains("Class: Cart"));
    assert!(read(dir.path(), "cart_.html").contains("Namespace: cart"));
    assert!(read(dir.path(), "global.html").contains("formatPrice"));
}

#[test]
fn store_navigation_groups_actions() {
    let dir = TempDir::new().unwrap();
    publish(&dir, &[]);
    let index = read(dir.path(), "index.html");

    assert!(index.contains("<h3>Stores</h3>"));
    assert!(index.contains(
        "<a href=\"store-Bookstore.html\">Bookstore</a><div class=\"hidden\" id=\"store:Bookstore_sub\">"
    ));
    assert!(index.contains(
        "<div class=\"member-type\">Actions</div><ul class=\"inner\">\
         <li><a href=\"store-Bookstore.html#.getBooksByAuthor\">getBooksByAuthor</a></li></ul>"
    ));
    assert!(index.contains(
        "<div class=\"member-type\">Getters</div><ul class=\"inner\">\
         <li><a href=\"store-Bookstore.html#.booksCount\">booksCount</a></li></ul>"
    ));
    // listed once, under Actions only
    assert_eq!(index.matches(">getBooksByAuthor</a>").count(), 1);
    assert!(!index.contains("<div class=\"member-type\">Methods</div>"));
}

#[test]
fn component_page_shows_vocabulary() {
    let dir = TempDir::new().unwrap();
    publish(&dir, &[]);
    let page = read(dir.path(), "component-BookList.html");

    assert!(page.contains("<h3 class=\"subsection-title\">Props</h3>"));
    assert!(page.contains("<h3 class=\"subsection-title\">Computed members</h3>"));
    assert!(page.contains("<code>mounted</code> Loads the catalogue"));
    assert!(page.contains("<code>/books</code>"));
    assert!(page.contains("components_BookList.vue.html#line11"));
}

#[test]
fn inline_links_and_sources_resolve() {
    let dir = TempDir::new().unwrap();
    publish(&dir, &[]);
    let store = read(dir.path(), "store-Bookstore.html");

    assert!(store.contains(
        "Start with <a href=\"store-Bookstore.html#.getBooksByAuthor\">store:Bookstore.getBooksByAuthor</a>."
    ));
    assert!(store.contains("<dt class=\"tag-namespaced\">Namespaced:</dt>"));
    assert!(store.contains("<p class=\"code-caption\">Dispatch</p>"));
    assert!(store.contains("<a href=\"model-Book.html\">model:Book</a>"));

    let listing = read(dir.path(), "bookstore-module.js.html");
    assert!(listing.contains("<li id=\"line20\">"));
    assert!(listing.contains("Source: bookstore-module.js"));
}

#[test]
fn unreadable_source_is_logged_and_skipped() {
    let dir = TempDir::new().unwrap();
    cmd()
        .args(["-d", dir.path().to_str().unwrap()])
        .arg(fixture_path("bookstore.json"))
        .assert()
        .success()
        .stderr(predicate::str::contains("unable to read source file"));
    assert!(!dir.path().join("models_missing.js.html").exists());
}

#[test]
fn private_doclets_need_flag() {
    let dir = TempDir::new().unwrap();
    publish(&dir, &[]);
    assert!(!read(dir.path(), "store-Bookstore.html").contains("secretHelper"));

    let dir = TempDir::new().unwrap();
    publish(&dir, &["--private"]);
    assert!(read(dir.path(), "store-Bookstore.html").contains("secretHelper"));
}

#[test]
fn search_index_lists_entities() {
    let dir = TempDir::new().unwrap();
    publish(&dir, &[]);
    let index: serde_json::Value =
        serde_json::from_str(&read(dir.path(), "search-index.json")).unwrap();
    let entries = index.as_array().unwrap();
    let action = entries
        .iter()
        .find(|e| e["longname"] == "store:Bookstore.getBooksByAuthor")
        .unwrap();
    assert_eq!(action["is"], "action");
    assert_eq!(action["url"], "store-Bookstore.html#.getBooksByAuthor");
    assert!(entries.iter().all(|e| e["longname"] != "tmp"));
}

// -- options --

#[test]
fn configuration_file_switches() {
    let dir = TempDir::new().unwrap();
    let conf = dir.path().join("conf.json");
    fs::write(
        &conf,
        r#"{"templates": {"useCollapsibles": false, "separateMembers": false, "searchIndex": false}}"#,
    )
    .unwrap();
    let out = dir.path().join("site");
    cmd()
        .args(["-c", conf.to_str().unwrap(), "-d", out.to_str().unwrap()])
        .arg(fixture_path("bookstore.json"))
        .assert()
        .success();

    assert!(!read(&out, "index.html").contains("toggle-subnav"));
    let store = read(&out, "store-Bookstore.html");
    assert!(store.contains("<h3 class=\"subsection-title\">Methods</h3>"));
    assert!(!store.contains("<h3 class=\"subsection-title\">Actions</h3>"));
    assert!(!out.join("search-index.json").exists());
}

#[test]
fn versioned_destination() {
    let dir = TempDir::new().unwrap();
    let conf = dir.path().join("conf.json");
    fs::write(&conf, r#"{"templates": {"useVersionning": true}}"#).unwrap();
    let out = dir.path().join("site");
    cmd()
        .args(["-c", conf.to_str().unwrap(), "-d", out.to_str().unwrap()])
        .arg(fixture_path("bookstore.json"))
        .assert()
        .success();
    assert!(out.join("bookstore-demo/1.0.0/index.html").is_file());
}

#[test]
fn readme_and_main_page_title() {
    let dir = TempDir::new().unwrap();
    let readme = dir.path().join("README.md");
    fs::write(&readme, "# Bookstore demo\n\nSee {@link store:Bookstore}.\n").unwrap();
    let out = dir.path().join("site");
    cmd()
        .args(["-d", out.to_str().unwrap(), "-R", readme.to_str().unwrap()])
        .args(["--mainpagetitle", "Bookstore docs"])
        .arg(fixture_path("bookstore.json"))
        .assert()
        .success();
    let index = read(&out, "index.html");
    assert!(index.contains("<h1>Bookstore demo</h1>"));
    assert!(index.contains("See <a href=\"store-Bookstore.html\">store:Bookstore</a>."));
    assert!(index.contains("<h3>Bookstore docs</h3>"));
    assert!(index.contains("<h3>bookstore-demo 1.0.0</h3>"));
}

#[test]
fn tutorials_are_emitted_parent_first() {
    let dir = TempDir::new().unwrap();
    let tutorials = dir.path().join("tutorials");
    fs::create_dir(&tutorials).unwrap();
    fs::write(tutorials.join("setup.md"), "Install the **store**.").unwrap();
    fs::write(tutorials.join("install.md"), "Run the installer.").unwrap();
    fs::write(
        tutorials.join("setup.json"),
        r#"{"title": "Getting set up", "children": ["install"]}"#,
    )
    .unwrap();
    let out = dir.path().join("site");
    cmd()
        .args(["-d", out.to_str().unwrap(), "-u", tutorials.to_str().unwrap()])
        .arg(fixture_path("bookstore.json"))
        .assert()
        .success();

    let setup = read(&out, "tutorial-setup.html");
    assert!(setup.contains("Tutorial: Getting set up"));
    assert!(setup.contains("<strong>store</strong>"));
    assert!(setup.contains("<a href=\"tutorial-install.html\">install</a>"));
    assert!(out.join("tutorial-install.html").is_file());
    assert!(read(&out, "index.html").contains("<h3>Tutorials</h3>"));
}

#[test]
fn explain_prints_normalized_doclets() {
    let assert = cmd()
        .args(["-X", &fixture_path("bookstore.json")])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let docs: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let store = docs
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["longname"] == "store:Bookstore")
        .unwrap();
    assert_eq!(store["kind"], "module");
    assert_eq!(store["is"], "store");
    assert_eq!(store["scope"], "static");
    assert_eq!(store["namespaced"], true);
}

#[test]
fn reads_stdin() {
    let dir = TempDir::new().unwrap();
    let input = fs::read_to_string(fixture_path("bookstore.json")).unwrap();
    cmd()
        .args(["-d", dir.path().to_str().unwrap(), "-"])
        .write_stdin(input)
        .assert()
        .success();
    assert!(dir.path().join("store-Bookstore.html").is_file());
}

// -- failures --

#[test]
fn missing_input_fails() {
    cmd()
        .arg("/no/such/dump.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no files matched"));
}

#[test]
fn missing_layout_file_fails() {
    let dir = TempDir::new().unwrap();
    let conf = dir.path().join("conf.json");
    fs::write(
        &conf,
        r#"{"templates": {"default": {"layoutFile": "nowhere/layout.hbs"}}}"#,
    )
    .unwrap();
    cmd()
        .args(["-c", conf.to_str().unwrap(), "-d", dir.path().join("site").to_str().unwrap()])
        .arg(fixture_path("bookstore.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("layout file"));
}

#[test]
fn invalid_template_directory_fails() {
    let dir = TempDir::new().unwrap();
    cmd()
        .args(["-t", dir.path().to_str().unwrap(), "-d", dir.path().join("site").to_str().unwrap()])
        .arg(fixture_path("bookstore.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("template directory"));
}
