fn main() {
    let src = ":::{badge} New\n:color: green\n:::\n";
    let md = patitas::create_markdown();
    let doc = md.parse_to_ast(src);
    if let patitas::ast::Block::Directive(d) = &doc.children[0] {
        println!("pre-render options: {:?}", d.options);
    }
    let html = md.convert(src);
    println!("HTML: {:?}", html);
}
