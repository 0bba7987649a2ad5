use sourcelink::http::rewrite::{rewrite_request, set_header};

#[test]
fn test_rewrite_scenario_default_port() {
    let req = "GET / HTTP/1.1\r\nHost: x\r\n\r\n";
    let out = rewrite_request(req, "api.example.com", "sid=1");

    assert_eq!(
        out,
        "GET / HTTP/1.1\r\nHost: api.example.com\r\nCookie: sid=1\r\n\r\n"
    );
}

#[test]
fn test_rewrite_scenario_custom_port() {
    let req = "GET / HTTP/1.1\r\nHost: x\r\n\r\n";
    let out = rewrite_request(req, "api.example.com:8080", "sid=1");

    assert!(out.contains("\r\nHost: api.example.com:8080\r\n"));
}

#[test]
fn test_replace_existing_host_keeps_everything_else() {
    let req = "GET /a/b.cs HTTP/1.1\r\nUser-Agent: dbg\r\nHost: old.example\r\nAccept: */*\r\n\r\n";
    let out = set_header(req, "Host", "gitlab.local");

    assert_eq!(
        out,
        "GET /a/b.cs HTTP/1.1\r\nUser-Agent: dbg\r\nHost: gitlab.local\r\nAccept: */*\r\n\r\n"
    );
}

#[test]
fn test_replace_does_not_swallow_following_headers() {
    let req = "GET / HTTP/1.1\r\nCookie: a=1\r\nX-One: 1\r\nX-Two: 2\r\n\r\n";
    let out = set_header(req, "Cookie", "_gitlab_session=abc");

    assert_eq!(
        out,
        "GET / HTTP/1.1\r\nCookie: _gitlab_session=abc\r\nX-One: 1\r\nX-Two: 2\r\n\r\n"
    );
}

#[test]
fn test_insert_missing_cookie_before_terminator() {
    let req = "GET / HTTP/1.1\r\nHost: gitlab.local\r\nAccept: */*\r\n\r\n";
    let out = set_header(req, "Cookie", "sid=1");

    assert_eq!(
        out,
        "GET / HTTP/1.1\r\nHost: gitlab.local\r\nAccept: */*\r\nCookie: sid=1\r\n\r\n"
    );
    assert!(out.starts_with("GET / HTTP/1.1\r\nHost: gitlab.local\r\nAccept: */*\r\n"));
}

#[test]
fn test_insert_keeps_body_after_terminator() {
    let req = "POST /x HTTP/1.1\r\nHost: a\r\n\r\nbody";
    let out = set_header(req, "Cookie", "sid=1");

    assert_eq!(out, "POST /x HTTP/1.1\r\nHost: a\r\nCookie: sid=1\r\n\r\nbody");
}

#[test]
fn test_no_terminator_no_key_is_unchanged() {
    for req in ["", "GET / HTTP/1.1", "GET / HTTP/1.1\r\nAccept: */*\r\n"] {
        assert_eq!(set_header(req, "Cookie", "sid=1"), req);
    }
}

#[test]
fn test_key_at_end_without_line_break_is_unchanged() {
    let req = "GET / HTTP/1.1\r\nHost: x";
    assert_eq!(set_header(req, "Host", "y"), req);
}

#[test]
fn test_rewrite_is_idempotent() {
    let req = "GET / HTTP/1.1\r\nHost: x\r\nAccept: */*\r\n\r\n";

    let once = rewrite_request(req, "gitlab.local", "_gitlab_session=abc");
    let twice = rewrite_request(&once, "gitlab.local", "_gitlab_session=abc");
    assert_eq!(once, twice);

    let host_once = set_header(req, "Host", "gitlab.local");
    assert_eq!(set_header(&host_once, "Host", "gitlab.local"), host_once);
}

#[test]
fn test_empty_value() {
    let req = "GET / HTTP/1.1\r\nHost: x\r\n\r\n";
    let out = set_header(req, "Cookie", "_gitlab_session=");

    assert_eq!(out, "GET / HTTP/1.1\r\nHost: x\r\nCookie: _gitlab_session=\r\n\r\n");
}

#[test]
fn test_non_ascii_text_survives() {
    let req = "GET /ścieżka HTTP/1.1\r\nHost: x\r\n\r\n";
    let out = rewrite_request(req, "gitlab.local", "sid=1");

    assert_eq!(
        out,
        "GET /ścieżka HTTP/1.1\r\nHost: gitlab.local\r\nCookie: sid=1\r\n\r\n"
    );
}
