//! Shallow GLSL ES front end for the recording context.
//!
//! Only catches what a typo usually breaks: misplaced `#version`, unbalanced
//! delimiters, a missing `main`, and a fragment shader without default float
//! precision. Diagnostics use the `ERROR: 0:<line>: '<token>' : <message>`
//! layout drivers print.

use crate::context::ShaderKind;

#[derive(Debug, Clone, PartialEq)]
struct Token {
    text: String,
    line: usize,
}

/// A global `attribute`/`in`/`uniform` declaration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Declaration {
    pub name: String,
    pub glsl_type: String,
}

/// Declarations a linked program exposes.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Interface {
    /// Vertex inputs, in declaration order.
    pub attributes: Vec<Declaration>,
    pub uniforms: Vec<Declaration>,
}

/// Check a shader; `Err` carries the info log.
pub(crate) fn check_source(kind: ShaderKind, source: &str) -> Result<(), String> {
    let mut log = String::new();

    for (idx, line) in source.lines().enumerate() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("#version") {
            if idx != 0 {
                log.push_str(&error_line(
                    idx + 1,
                    "#version",
                    "must occur on the first line in a shader",
                ));
            } else {
                let version: Vec<&str> = rest.split_whitespace().collect();
                if !matches!(version[..], ["100"] | ["300", "es"]) {
                    log.push_str(&error_line(1, "#version", "version number not supported"));
                }
            }
        }
    }

    let tokens = tokenize(source);

    let mut stack: Vec<(char, usize)> = Vec::new();
    for token in &tokens {
        let Some(c) = single_char(&token.text) else {
            continue;
        };
        match c {
            '(' | '{' | '[' => stack.push((c, token.line)),
            ')' | '}' | ']' => {
                let expected = match c {
                    ')' => '(',
                    '}' => '{',
                    _ => '[',
                };
                match stack.pop() {
                    Some((open, _)) if open == expected => {}
                    _ => log.push_str(&error_line(token.line, &token.text, "syntax error")),
                }
            }
            _ => {}
        }
    }
    if let Some((open, line)) = stack.last() {
        log.push_str(&error_line(
            *line,
            &open.to_string(),
            "syntax error, unexpected end of file",
        ));
    }

    let has_main = tokens
        .windows(3)
        .any(|w| w[0].text == "void" && w[1].text == "main" && w[2].text == "(");
    if !has_main {
        log.push_str("ERROR: 0:?: 'main' : Missing main()\n");
    }

    if kind == ShaderKind::Fragment {
        let has_precision = tokens.windows(3).any(|w| {
            w[0].text == "precision"
                && matches!(w[1].text.as_str(), "lowp" | "mediump" | "highp")
                && w[2].text == "float"
        });
        if !has_precision {
            let line = tokens.first().map(|t| t.line).unwrap_or(1);
            log.push_str(&error_line(line, "", "No precision specified for (float)"));
        }
    }

    if log.is_empty() {
        Ok(())
    } else {
        Err(log)
    }
}

/// Collect global inputs and uniforms.
///
/// `in` only counts as an attribute in vertex shaders; in fragment shaders
/// it is a varying. Uniform blocks are skipped.
pub(crate) fn scan_interface(kind: ShaderKind, source: &str) -> Interface {
    let mut interface = Interface::default();
    let mut depth = 0usize;
    let mut statement: Vec<String> = Vec::new();

    for token in tokenize(source) {
        match token.text.as_str() {
            "{" => {
                depth += 1;
                statement.clear();
            }
            "}" => {
                depth = depth.saturating_sub(1);
                statement.clear();
            }
            ";" if depth == 0 => {
                if let Some((qualifier, decl)) = parse_declaration(&statement) {
                    match qualifier {
                        "uniform" => interface.uniforms.push(decl),
                        "attribute" => interface.attributes.push(decl),
                        "in" if kind == ShaderKind::Vertex => interface.attributes.push(decl),
                        _ => {}
                    }
                }
                statement.clear();
            }
            _ if depth == 0 => statement.push(token.text),
            _ => {}
        }
    }

    interface
}

fn parse_declaration(statement: &[String]) -> Option<(&'static str, Declaration)> {
    let (at, qualifier) = statement.iter().enumerate().find_map(|(i, t)| match t.as_str() {
        "uniform" => Some((i, "uniform")),
        "attribute" => Some((i, "attribute")),
        "in" => Some((i, "in")),
        _ => None,
    })?;

    // `<qualifier> [precision] <type> <name>` optionally followed by `[N]`
    let rest = &statement[at + 1..];
    let end = rest
        .iter()
        .position(|t| t == "[" || t == "=")
        .unwrap_or(rest.len());
    let words = &rest[..end];
    if words.len() < 2 {
        return None;
    }
    let name = &words[words.len() - 1];
    let glsl_type = &words[words.len() - 2];
    if !is_identifier(name) || !is_identifier(glsl_type) {
        return None;
    }

    Some((
        qualifier,
        Declaration {
            name: name.clone(),
            glsl_type: glsl_type.clone(),
        },
    ))
}

fn error_line(line: usize, token: &str, message: &str) -> String {
    format!("ERROR: 0:{line}: '{token}' : {message}\n")
}

fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    let c = chars.next()?;
    chars.next().is_none().then_some(c)
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split into identifiers, numbers and single-character punctuation.
/// Comments and preprocessor lines are dropped.
fn tokenize(source: &str) -> Vec<Token> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut at_line_start = true;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\n' {
            line += 1;
            at_line_start = true;
            i += 1;
            continue;
        }
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c == '#' && at_line_start {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }
        at_line_start = false;

        if c == '/' && chars.get(i + 1) == Some(&'/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }
        if c == '/' && chars.get(i + 1) == Some(&'*') {
            i += 2;
            while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                if chars[i] == '\n' {
                    line += 1;
                }
                i += 1;
            }
            i += 2;
            continue;
        }

        let start = i;
        if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
            while i < chars.len()
                && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '.')
            {
                i += 1;
            }
        } else {
            i += 1;
        }
        tokens.push(Token {
            text: chars[start..i].iter().collect(),
            line,
        });
    }

    tokens
}
