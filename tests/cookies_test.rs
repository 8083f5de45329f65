use sessionnet::cookies::canonicalcookie::CanonicalCookie;
use sessionnet::cookies::jar::CookieJar;
use sessionnet::cookies::monster::CookieMonster;
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use url::Url;

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

fn names(jar: &CookieJar, target: &str) -> Vec<String> {
    jar.get_cookies_for(target)
        .into_iter()
        .map(|c| c.name)
        .collect()
}

#[test]
fn test_set_then_get() {
    let jar = CookieJar::new();
    jar.set_cookie(&url("https://example.com/foo"), "foo=bar; Path=/")
        .unwrap();

    let cookies = jar.get_cookies(&url("https://example.com/foo"));
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].name, "foo");
    assert_eq!(cookies[0].value, "bar");
    assert_eq!(cookies[0].path, "/");
}

#[test]
fn test_domain_matching() {
    let jar = CookieJar::new();
    let origin = url("https://a.example.com");

    jar.set_cookie(&origin, "host=val").unwrap();
    jar.set_cookie(&origin, "domain=val; Domain=example.com")
        .unwrap();

    let on_host = names(&jar, "https://a.example.com/");
    assert!(on_host.contains(&"host".to_string()));
    assert!(on_host.contains(&"domain".to_string()));

    // Host-only cookies stay on their host; domain cookies cover siblings.
    assert_eq!(names(&jar, "https://b.example.com/"), ["domain"]);
    assert_eq!(names(&jar, "https://example.com/"), ["domain"]);
    assert!(names(&jar, "https://notexample.com/").is_empty());
}

#[test]
fn test_path_matching() {
    let jar = CookieJar::new();
    let origin = url("https://example.com/foo/bar");

    jar.set_cookie(&origin, "root=val; Path=/").unwrap();
    jar.set_cookie(&origin, "foo=val; Path=/foo").unwrap();
    jar.set_cookie(&origin, "baz=val; Path=/baz").unwrap();

    assert_eq!(names(&jar, "https://example.com/foo/bar"), ["foo", "root"]);
    // "/foo" must not match "/foobar"
    assert_eq!(names(&jar, "https://example.com/foobar"), ["root"]);
}

#[test]
fn test_replacement_keeps_single_entry() {
    let jar = CookieJar::new();
    let origin = url("https://example.com/");

    jar.set_cookie(&origin, "session=old").unwrap();
    jar.set_cookie(&origin, "session=new").unwrap();

    let cookies = jar.get_cookies(&origin);
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].value, "new");
}

#[test]
fn test_same_name_different_path_coexist() {
    let jar = CookieJar::new();
    let origin = url("https://example.com/");

    jar.set_cookie(&origin, "id=root; Path=/").unwrap();
    jar.set_cookie(&origin, "id=api; Path=/api").unwrap();

    assert_eq!(jar.len(), 2);
    assert_eq!(
        jar.cookie_header(&url("https://example.com/api/x")).as_deref(),
        Some("id=api; id=root")
    );
}

#[test]
fn test_equal_paths_keep_creation_order() {
    let jar = CookieJar::new();
    let origin = url("https://example.com/");

    jar.set_cookie(&origin, "first=1").unwrap();
    jar.set_cookie(&origin, "second=2").unwrap();
    jar.set_cookie(&origin, "third=3").unwrap();
    // Replacing keeps the original position.
    jar.set_cookie(&origin, "first=updated").unwrap();

    assert_eq!(
        jar.cookie_header(&origin).as_deref(),
        Some("first=updated; second=2; third=3")
    );
}

#[test]
fn test_expired_cookie_deletes_existing() {
    let jar = CookieJar::new();
    let origin = url("https://example.com/");

    jar.set_cookie(&origin, "token=abc").unwrap();
    jar.set_cookie(&origin, "token=gone; Expires=Thu, 01 Jan 1970 00:00:00 GMT")
        .unwrap();

    assert!(jar.get_cookies(&origin).is_empty());
    assert!(jar.is_empty());
}

#[test]
fn test_secure_cookie_not_sent_over_http() {
    let jar = CookieJar::new();
    jar.set_cookie(&url("https://example.com/"), "s=1; Secure")
        .unwrap();

    assert_eq!(names(&jar, "https://example.com/"), ["s"]);
    assert!(names(&jar, "http://example.com/").is_empty());
}

#[test]
fn test_public_suffix_domain_rejected() {
    let jar = CookieJar::new();
    let result = jar.set_cookie(&url("https://example.co.uk/"), "a=1; Domain=co.uk");
    assert!(result.is_err());
    assert!(jar.is_empty());
}

#[test]
fn test_ip_host_is_exact_match() {
    let jar = CookieJar::new();
    jar.set_cookie(&url("http://127.0.0.1:8080/"), "local=1")
        .unwrap();

    assert_eq!(names(&jar, "http://127.0.0.1:9090/v1"), ["local"]);
    assert!(names(&jar, "http://127.0.0.2/").is_empty());
}

#[test]
fn test_unparseable_or_hostless_url_matches_nothing() {
    let jar = CookieJar::new();
    jar.set_cookie(&url("https://example.com/"), "a=1").unwrap();

    assert!(jar.get_cookies_for("::not-a-url").is_empty());
    assert!(jar.get_cookies(&url("data:text/plain,hello")).is_empty());
}

#[test]
fn test_store_shared_between_jars() {
    let store = Arc::new(CookieMonster::new());
    let a = CookieJar::with_store(store.clone());
    let b = CookieJar::with_store(store.clone());

    a.set_cookie(&url("https://example.com/"), "shared=1").unwrap();
    assert_eq!(names(&b, "https://example.com/"), ["shared"]);
    assert_eq!(store.total_cookie_count(), 1);
}

#[test]
fn test_purge_expired_drops_stale_cookies() {
    let store = CookieMonster::new();
    let now = OffsetDateTime::now_utc();

    let mut short = CanonicalCookie::new(
        "short",
        "1",
        "example.com",
        "/",
        now,
        Some(now + Duration::milliseconds(50)),
    );
    short.host_only = false;
    store.set_canonical_cookie(short);
    store.set_canonical_cookie(CanonicalCookie::new(
        "session", "1", "example.com", "/", now, None,
    ));

    std::thread::sleep(std::time::Duration::from_millis(100));

    // Already invisible to reads before the purge runs.
    assert_eq!(store.get_cookies_for_url(&url("https://example.com/")).len(), 1);
    assert_eq!(store.purge_expired(), 1);
    assert_eq!(store.total_cookie_count(), 1);
}

#[test]
fn test_per_domain_limit_evicts_oldest() {
    let jar = CookieJar::new();
    let origin = url("https://example.com/");

    for i in 0..60 {
        jar.set_cookie(&origin, &format!("c{i}=v")).unwrap();
    }

    let names = names(&jar, "https://example.com/");
    assert_eq!(names.len(), 50);
    assert!(!names.contains(&"c0".to_string()));
    assert!(names.contains(&"c59".to_string()));
}
