use axum::http::{header, HeaderMap};

/// Estrae il valore di un cookie dagli header `Cookie` della richiesta
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix(prefix.as_str()))
        .map(|value| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}
