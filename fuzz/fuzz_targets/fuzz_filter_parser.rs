#![no_main]

use libfuzzer_sys::fuzz_target;
use relframe_core::query::parser::Parser;

fuzz_target!(|data: &[u8]| {
    // Convert bytes to string (ignore invalid UTF-8)
    if let Ok(expr) = std::str::from_utf8(data) {
        // Limit expression length to prevent timeout
        if expr.len() > 10_000 {
            return;
        }

        // Parsing must never panic; a parsed tree must re-render and re-parse
        if let Ok(mut parser) = Parser::new(expr) {
            if let Ok(ast) = parser.parse() {
                let rendered = ast.to_string();
                let reparsed = Parser::new(&rendered).and_then(|mut p| p.parse());
                assert!(reparsed.is_ok(), "{} -> {}", expr, rendered);
            }
        }
    }
});
