//! Markdown → HTML for READMEs and tutorials.

use pulldown_cmark::{html, Options, Parser};

fn md_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_GFM);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

pub fn to_html(content: &str) -> String {
    let parser = Parser::new_ext(content, md_options());
    let mut out = String::with_capacity(content.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
