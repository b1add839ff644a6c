use a2s::{render, render_with_options, Diagram, ObjectLibrary, RenderOptions};
use pretty_assertions::assert_eq;

fn parse(input: &str) -> Diagram {
    Diagram::parse(input, &RenderOptions::default())
}

#[test]
fn test_render_is_deterministic() {
    let input = "\
.-----.      +----+
| app |----->| db |
'-----'      +----+
   :
   v
  log

[1,13]: {\"fill\": \"#88d\"}
";
    assert_eq!(render(input), render(input));
}

#[test]
fn test_plain_box() {
    let diagram = parse("+--+\n|  |\n+--+");
    assert_eq!(diagram.boxes().count(), 1);
    assert_eq!(diagram.lines().count(), 0);
    assert_eq!(diagram.text().count(), 0);
    assert_eq!(diagram.grid().to_string(), "    \n    \n    ");

    let svg = diagram.to_svg(&ObjectLibrary::new());
    assert!(svg.contains(r#"<g id="boxes" stroke="black" stroke-width="2" fill="none">"#));
    assert!(svg.contains(
        r##"<path id="path0" filter="url(#dsFilter)" fill="#fff" d="M 4.5 8 L 31.5 8 L 31.5 40 L 4.5 40 Z" />"##
    ));
    assert!(!svg.contains("<text"));
}

#[test]
fn test_arrow_between_words() {
    let diagram = parse("A->B");
    assert_eq!(diagram.boxes().count(), 0);
    assert_eq!(diagram.lines().count(), 1);
    let words: Vec<&str> = diagram.text().map(|t| t.text.as_str()).collect();
    assert_eq!(words, vec!["A", "B"]);

    let svg = diagram.to_svg(&ObjectLibrary::new());
    assert!(svg.contains(r#"<path id="path0" marker-start="url(#iPointer)" d="M 22.5 8 L 13.5 8" />"#));
    assert!(svg.contains(r##"<text x="-0.9" y="12.8" id="text0" fill="#000">A</text>"##));
    assert!(svg.contains(r##"<text x="26.1" y="12.8" id="text1" fill="#000">B</text>"##));
}

#[test]
fn test_box_with_wall_junctions_renders_once() {
    let input = "          +----+--------+                                :
          |    |        |             .----------------. |
          v    |        |             |                | |
     #---------+---.    |        o----+----> Waow !    | v
     |             |<---+       /     |                | ^
====>| Hello       |           /      '----------------' |
====>| (svg) World '------.   /  #------#   .-------.    |
     |    .-----#         |==+   |      |   |       |    |
     '----#     '---------#      #------#   '-------'";
    let diagram = parse(input);

    let around_hello: Vec<&a2s::Path> = diagram.boxes().filter(|b| b.has_point(7.0, 5.3)).collect();
    assert_eq!(around_hello.len(), 1);
    let hello = around_hello[0];
    assert!(hello.is_clockwise());
    assert_eq!(hello.first().map(|p| (p.row, p.col)), Some((3, 5)));
    assert!(hello.text().iter().any(|t| t.text == "Hello"));

    let svg = diagram.to_svg(&ObjectLibrary::new());
    assert_eq!(svg.matches(r#"d="M 49.5 56 "#).count(), 1);
}

#[test]
fn test_text_contrasts_with_box_fill() {
    let diagram = parse(
        "\
+--------+
|[d]     |
|  hi    |
+--------+

[d]: {\"fill\": \"#000\", \"a2s:delref\": true}
",
    );
    let b = diagram.boxes().next().unwrap();
    assert_eq!(b.option_str("fill"), Some("#000"));
    assert_eq!(b.text().len(), 1);
    assert_eq!(b.text()[0].text, "hi");
    assert_eq!(b.text()[0].option_str("fill"), Some("#fff"));
    assert_eq!(diagram.text().count(), 0);
}

#[test]
fn test_anchor_reference_styles_box() {
    let svg = render("+--+\n|  |\n+--+\n\n[0,0]: {\"fill\": \"#f00\"}");
    assert!(svg.contains(r##"filter="url(#dsFilter)" fill="#f00" d="M 4.5 8"##));
    assert!(!svg.contains("[0,0]"));
}

#[test]
fn test_custom_object() {
    let mut library = ObjectLibrary::new();
    library
        .insert_source("cyl", "<path width=\"10\" height=\"10\" d=\"M 0 0 L 10 10\" />")
        .unwrap();
    let input = "\
+----+
|[c] |
+----+

[c]: {\"a2s:type\": \"cyl\", \"a2s:delref\": true}
";
    let svg = render_with_options(input, &RenderOptions::new().with_blur(false), &library);
    assert!(svg.contains(
        r##"<path id="path0" d="M 4.5 8 L 49.5 40" filter="url(#dsFilterNoBlur)" fill="#fff" />"##
    ));
    assert!(!svg.contains("<text"));
}

#[test]
fn test_empty_input() {
    let svg = render("");
    assert!(svg.starts_with(r#"<svg width="10px" height="16px""#));
    assert!(svg.ends_with("</svg>\n"));
}
