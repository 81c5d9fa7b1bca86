use pulldown_cmark::{html, Options, Parser};

/// Convert Markdown text to HTML.
pub fn render_markdown(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(text, options);
    let mut output = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_headings_and_paragraphs() {
        let html = render_markdown("# Title\n\nHello *world*.\n");
        assert_eq!(html, "<h1>Title</h1>\n<p>Hello <em>world</em>.</p>\n");
    }

    #[test]
    fn attribute_comments_produce_no_output() {
        let html = render_markdown("[//]: # ([title]Hidden)\n\nVisible\n");
        assert_eq!(html, "<p>Visible</p>\n");
    }

    #[test]
    fn template_placeholders_survive_rendering() {
        let html = render_markdown("Hello {{ name }}!\n");
        assert!(html.contains("{{ name }}"));
    }
}
