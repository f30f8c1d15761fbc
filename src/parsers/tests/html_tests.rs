use crate::parsers::html;
use url::Url;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_text_skips_scripts_and_styles() {
        let fragment = r#"
            <style>.x { color: red }</style>
            <p>Breathable   mesh upper.</p>
            <script>window.track('view');</script>
            <ul><li>Lightweight</li><li>Durable</li></ul>
        "#;
        assert_eq!(
            html::fragment_text(fragment),
            "Breathable mesh upper. Lightweight Durable"
        );
    }

    #[test]
    fn test_fragment_text_decodes_entities() {
        assert_eq!(html::fragment_text("<p>Salt &amp; Pepper</p>"), "Salt & Pepper");
    }

    #[test]
    fn test_parse_links() {
        let page = r##"<html><body>
            <a href="/products/a">A</a>
            <a href=" /collections/all ">All</a>
            <a>No href</a>
            <a href="">Empty</a>
        </body></html>"##;
        assert_eq!(
            html::parse_links(page),
            vec!["/products/a".to_string(), "/collections/all".to_string()]
        );
    }

    #[test]
    fn test_resolve_links() {
        let base = Url::parse("https://shop.example.com/collections/tops").unwrap();
        let page = r##"<body>
            <a href="/products/a">A</a>
            <a href="b">B</a>
            <a href="https://cdn.example.com/x.png">img</a>
            <a href="javascript:void(0)">js</a>
            <a href="#main">skip</a>
        </body>"##;

        let resolved = html::resolve_links(page, &base)
            .into_iter()
            .map(|u| u.to_string())
            .collect::<Vec<_>>();

        assert_eq!(
            resolved,
            vec![
                "https://shop.example.com/products/a",
                "https://shop.example.com/collections/b",
                "https://cdn.example.com/x.png",
            ]
        );
    }
}
