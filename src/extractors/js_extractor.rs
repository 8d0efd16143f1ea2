//! JavaScript state extraction using SWC AST parsing
//!
//! Shops often ship product state as a literal assigned to a global:
//! - `var pdpData = {...}` / `let` / `const`
//! - `window.__PRELOADED_STATE__ = {...}`
//! - `pdpData = {...}`
//! - `x = JSON.parse('...')`
//!
//! Scripts that SWC cannot parse fall back to a regex that captures the
//! object literal up to the first `};`.

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use swc_common::{sync::Lrc, FileName, SourceMap};
use swc_ecma_ast::*;
use swc_ecma_parser::{lexer::Lexer, Parser, StringInput, Syntax};

use crate::error::ParseError;

/// Find the value assigned to global `name` in any inline script.
///
/// Scripts are searched in document order; the first one that yields a
/// value wins. If every script mentioning `name` fails to parse, the last
/// parse error is returned.
pub fn find_script_variable(document: &Html, name: &str) -> Result<Value, ParseError> {
    let selector =
        Selector::parse("script").map_err(|e| ParseError::Script(e.to_string()))?;

    let mut last_error = ParseError::VariableNotFound(name.to_string());

    for element in document.select(&selector) {
        let script_text = element.text().collect::<String>();
        if !script_text.contains(name) {
            continue;
        }

        match variable_from_script(&script_text, name) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = e,
        }
    }

    Err(last_error)
}

/// Look up `name` in one script's source
pub fn variable_from_script(source: &str, name: &str) -> Result<Value, ParseError> {
    match parse_script_assignments(source) {
        Ok(assignments) => {
            if let Some((_, value)) = assignments.into_iter().find(|(n, _)| n == name) {
                return Ok(value);
            }
            // The AST walk only sees top-level statements.
            variable_regex(source, name)
        }
        Err(parse_error) => {
            tracing::debug!(error = %parse_error, variable = name, "script did not parse, trying regex");
            variable_regex(source, name)
        }
    }
}

/// Parse JavaScript source and collect top-level assignments of literal values
fn parse_script_assignments(source: &str) -> Result<Vec<(String, Value)>, ParseError> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(FileName::Anon.into(), source.to_string());

    let lexer = Lexer::new(
        Syntax::Es(Default::default()),
        Default::default(),
        StringInput::from(&*fm),
        None,
    );

    let mut parser = Parser::new_from(lexer);

    let script = parser
        .parse_script()
        .map_err(|e| ParseError::Script(format!("{e:?}")))?;

    let mut result = Vec::new();
    for stmt in &script.body {
        collect_assignments(stmt, &mut result);
    }

    Ok(result)
}

fn collect_assignments(stmt: &Stmt, result: &mut Vec<(String, Value)>) {
    match stmt {
        Stmt::Decl(Decl::Var(var_decl)) => {
            for decl in &var_decl.decls {
                if let (Some(init), Pat::Ident(ident)) = (&decl.init, &decl.name) {
                    if let Some(value) = expr_to_json(init) {
                        result.push((ident.sym.as_str().to_string(), value));
                    }
                }
            }
        }
        Stmt::Expr(expr_stmt) => {
            if let Expr::Assign(assign) = &*expr_stmt.expr {
                let Some(target) = assign_target_name(&assign.left) else {
                    return;
                };
                if let Some(value) = expr_to_json(&assign.right) {
                    result.push((target, value));
                }
            }
        }
        _ => {}
    }
}

/// `x = ...` or `window.x = ...`
fn assign_target_name(target: &AssignTarget) -> Option<String> {
    match target {
        AssignTarget::Simple(SimpleAssignTarget::Ident(ident)) => {
            Some(ident.sym.as_str().to_string())
        }
        AssignTarget::Simple(SimpleAssignTarget::Member(member)) => {
            let Expr::Ident(obj) = &*member.obj else {
                return None;
            };
            if obj.sym.as_str() != "window" {
                return None;
            }
            match &member.prop {
                MemberProp::Ident(prop) => Some(prop.sym.as_str().to_string()),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Convert a JavaScript literal expression to JSON.
///
/// Object members whose values are not literals (functions, identifiers)
/// become `null` rather than discarding the whole object.
fn expr_to_json(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Lit(Lit::Str(s)) => Some(Value::String(s.value.as_str().unwrap_or("").to_string())),

        Expr::Lit(Lit::Num(n)) => number_to_json(n.value),

        Expr::Lit(Lit::Bool(b)) => Some(Value::Bool(b.value)),

        Expr::Lit(Lit::Null(_)) => Some(Value::Null),

        Expr::Object(obj) => {
            let mut map = serde_json::Map::new();
            for prop in &obj.props {
                if let PropOrSpread::Prop(prop) = prop {
                    if let Prop::KeyValue(kv) = &**prop {
                        if let Some(key) = prop_name_to_string(&kv.key) {
                            map.insert(key, expr_to_json(&kv.value).unwrap_or(Value::Null));
                        }
                    }
                }
            }
            Some(Value::Object(map))
        }

        Expr::Array(arr) => {
            let values = arr
                .elems
                .iter()
                .map(|elem| match elem {
                    Some(ExprOrSpread { expr, .. }) => expr_to_json(expr).unwrap_or(Value::Null),
                    None => Value::Null,
                })
                .collect();
            Some(Value::Array(values))
        }

        Expr::Call(call) if is_json_parse_call(call) => {
            let ExprOrSpread { expr: arg, .. } = call.args.first()?;
            if let Expr::Lit(Lit::Str(s)) = &**arg {
                return serde_json::from_str(s.value.as_str()?).ok();
            }
            None
        }

        Expr::Unary(unary) if unary.op == UnaryOp::Minus => {
            if let Expr::Lit(Lit::Num(n)) = &*unary.arg {
                return number_to_json(-n.value);
            }
            None
        }

        Expr::Paren(paren) => expr_to_json(&paren.expr),

        Expr::Tpl(tpl) if tpl.exprs.is_empty() => tpl
            .quasis
            .first()
            .map(|quasi| Value::String(quasi.raw.as_str().to_string())),

        _ => None,
    }
}

fn number_to_json(n: f64) -> Option<Value> {
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Some(Value::Number(serde_json::Number::from(n as i64)))
    } else {
        serde_json::Number::from_f64(n).map(Value::Number)
    }
}

/// Check if a call expression is JSON.parse(...)
fn is_json_parse_call(call: &CallExpr) -> bool {
    if let Callee::Expr(expr) = &call.callee {
        if let Expr::Member(member) = &**expr {
            if let Expr::Ident(obj) = &*member.obj {
                if obj.sym.as_ref() == "JSON" {
                    if let MemberProp::Ident(prop) = &member.prop {
                        return prop.sym.as_ref() == "parse";
                    }
                }
            }
        }
    }
    false
}

fn prop_name_to_string(name: &PropName) -> Option<String> {
    match name {
        PropName::Ident(ident) => Some(ident.sym.as_str().to_string()),
        PropName::Str(s) => s.value.as_str().map(|v| v.to_string()),
        PropName::Num(n) => Some(n.value.to_string()),
        _ => None,
    }
}

/// `name = {...};` captured lazily on a single line, then parsed as JSON
fn variable_regex(source: &str, name: &str) -> Result<Value, ParseError> {
    let pattern = format!(r"{}\s*=\s*(\{{.+?\}});", regex::escape(name));
    let re = Regex::new(&pattern).map_err(|e| ParseError::Script(e.to_string()))?;

    let captured = re
        .captures(source)
        .and_then(|c| c.get(1))
        .ok_or_else(|| ParseError::VariableNotFound(name.to_string()))?;

    Ok(serde_json::from_str(captured.as_str())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_and_window_assignments() {
        let html = r#"
        <html>
        <head>
            <script>
                var siteConfig = {currency: "INR", live: true};
                window.__PRELOADED_STATE__ = {
                    product: {productDetails: {price: {value: 1299}, images: [{url: "https://a/1.jpg"}]}}
                };
            </script>
        </head>
        </html>
        "#;

        let document = Html::parse_document(html);

        let config = find_script_variable(&document, "siteConfig").unwrap();
        assert_eq!(config["currency"], "INR");

        let state = find_script_variable(&document, "__PRELOADED_STATE__").unwrap();
        assert_eq!(state["product"]["productDetails"]["price"]["value"], 1299);
        assert_eq!(
            state["product"]["productDetails"]["images"][0]["url"],
            "https://a/1.jpg"
        );
    }

    #[test]
    fn test_plain_assignment_and_json_parse() {
        let source = r#"
            pdpData = {"price": {"mrp": 2499, "discounted": 1749}};
            var jobs = JSON.parse('[{"id":"123"}]');
        "#;

        let pdp = variable_from_script(source, "pdpData").unwrap();
        assert_eq!(pdp["price"]["discounted"], 1749);

        let jobs = variable_from_script(source, "jobs").unwrap();
        assert_eq!(jobs[0]["id"], "123");
    }

    #[test]
    fn test_non_literal_members_become_null() {
        let source = r#"var state = {onLoad: function () { return 1; }, price: -12.5, tag: `sale`};"#;
        let state = variable_from_script(source, "state").unwrap();
        assert!(state["onLoad"].is_null());
        assert_eq!(state["price"], -12.5);
        assert_eq!(state["tag"], "sale");
    }

    #[test]
    fn test_regex_fallback_for_unparseable_script() {
        // `<%= %>` template residue is not valid JavaScript.
        let source = r#"<%= header %> window.pdpData = {"price":{"mrp":"999"}}; <%= footer %>"#;
        let pdp = variable_from_script(source, "pdpData").unwrap();
        assert_eq!(pdp["price"]["mrp"], "999");
    }

    #[test]
    fn test_regex_fallback_reports_bad_json() {
        let source = r#"<%= x %> pdpData = {price: broken};"#;
        assert!(matches!(
            variable_from_script(source, "pdpData"),
            Err(ParseError::Json(_))
        ));
    }

    #[test]
    fn test_missing_variable() {
        let document = Html::parse_document("<script>var other = {a: 1};</script>");
        assert!(matches!(
            find_script_variable(&document, "pdpData"),
            Err(ParseError::VariableNotFound(_))
        ));
    }
}
