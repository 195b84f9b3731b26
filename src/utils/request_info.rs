// Browser context carried by lead submission requests

use axum::http::{header, HeaderMap};

fn header_str<'a>(headers: &'a HeaderMap, name: header::HeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Extract client IP address from proxy headers
/// Checks X-Forwarded-For first, then X-Real-IP
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get("x-forwarded-for").and_then(|h| h.to_str().ok()) {
        // X-Forwarded-For can contain multiple IPs, take the first one
        let ip = value.split(',').next().unwrap_or_default().trim();
        if !ip.is_empty() {
            return Some(ip.to_string());
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

/// Extract User-Agent from request headers
pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    header_str(headers, header::USER_AGENT).map(|s| s.to_string())
}

/// Primary language tag from Accept-Language (`pt-BR,pt;q=0.9` -> `pt-BR`)
pub fn extract_language(headers: &HeaderMap) -> Option<String> {
    header_str(headers, header::ACCEPT_LANGUAGE)
        .and_then(|value| value.split(',').next())
        .and_then(|tag| tag.split(';').next())
        .map(str::trim)
        .filter(|tag| !tag.is_empty() && *tag != "*")
        .map(|tag| tag.to_string())
}

/// Extract Referer from request headers
pub fn extract_referer(headers: &HeaderMap) -> Option<String> {
    header_str(headers, header::REFERER).map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_ip_priority() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.1, 198.51.100.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("192.168.1.1"));

        // X-Forwarded-For should take priority
        assert_eq!(extract_ip_address(&headers).as_deref(), Some("203.0.113.1"));
    }

    #[test]
    fn test_extract_ip_unknown() {
        assert_eq!(extract_ip_address(&HeaderMap::new()), None);
    }

    #[test]
    fn test_extract_user_agent() {
        let mut headers = HeaderMap::new();
        headers.insert("user-agent", HeaderValue::from_static("Mozilla/5.0 (Windows NT 10.0; Win64; x64)"));

        assert_eq!(
            extract_user_agent(&headers).as_deref(),
            Some("Mozilla/5.0 (Windows NT 10.0; Win64; x64)")
        );
        assert_eq!(extract_user_agent(&HeaderMap::new()), None);
    }

    #[test]
    fn test_extract_language_takes_first_tag() {
        let mut headers = HeaderMap::new();
        headers.insert("accept-language", HeaderValue::from_static("pt-BR,pt;q=0.9,en;q=0.8"));
        assert_eq!(extract_language(&headers).as_deref(), Some("pt-BR"));

        headers.insert("accept-language", HeaderValue::from_static("en;q=0.5"));
        assert_eq!(extract_language(&headers).as_deref(), Some("en"));

        headers.insert("accept-language", HeaderValue::from_static("*"));
        assert_eq!(extract_language(&headers), None);
    }

    #[test]
    fn test_extract_referer() {
        let mut headers = HeaderMap::new();
        headers.insert("referer", HeaderValue::from_static("https://www.google.com/"));
        assert_eq!(extract_referer(&headers).as_deref(), Some("https://www.google.com/"));
    }
}
