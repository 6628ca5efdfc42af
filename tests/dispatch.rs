// Dispatcher integration tests against a minimal local HTTP stub. The
// stub records each request line so the tests can assert on the verb,
// path and query string the client actually sent.

use courserec_cli::api::{ApiClient, Endpoint, Outcome, Params};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Spawn a stub server answering every request with the given status
/// line and body. Returns the base URL and a channel of request lines.
fn stub_server(status_line: &'static str, body: &'static str) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            if reader.read_line(&mut request_line).is_err() {
                continue;
            }
            // Drain headers; no request in this suite carries a body.
            loop {
                let mut line = String::new();
                match reader.read_line(&mut line) {
                    Ok(0) => break,
                    Ok(_) if line == "\r\n" => break,
                    Ok(_) => {}
                    Err(_) => break,
                }
            }

            let _ = tx.send(request_line.trim_end().to_string());
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    (base_url, rx)
}

#[test]
fn get_endpoint_sends_get_with_query_string() {
    let (base_url, requests) = stub_server(
        "200 OK",
        r#"{"data": [{"AppUserID": 1, "FullName": "Amy"}]}"#,
    );
    let api = ApiClient::new(base_url).unwrap();
    let params = Params::new().set("username", "amy").set("password", "pw");

    let outcome = api.dispatch(Endpoint::ValidateUser, &params);

    let line = requests.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(line, "GET /validate_user?username=amy&password=pw HTTP/1.1");
    assert!(matches!(outcome, Outcome::Success(rows) if rows.len() == 1));
}

#[test]
fn post_endpoint_sends_post_with_query_params() {
    let (base_url, requests) = stub_server("200 OK", r#"{"data": [{"EnrollmentSucceeded": true}]}"#);
    let api = ApiClient::new(base_url).unwrap();
    let params = Params::new().set("studentID", "42").set("courseOfferingID", "7");

    api.dispatch(Endpoint::EnrollStudent, &params);

    let line = requests.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(
        line,
        "POST /enroll_student_in_course_offering?studentID=42&courseOfferingID=7 HTTP/1.1"
    );
}

#[test]
fn dispatch_issues_exactly_one_request() {
    let (base_url, requests) = stub_server("200 OK", r#"{"data": []}"#);
    let api = ApiClient::new(base_url).unwrap();
    let params = Params::new().set("studentID", "42");

    api.dispatch(Endpoint::GetEnrolledOfferings, &params);

    assert!(requests.recv_timeout(Duration::from_secs(2)).is_ok());
    assert!(
        requests.recv_timeout(Duration::from_millis(200)).is_err(),
        "dispatch sent more than one request"
    );
}

#[test]
fn empty_data_array_classifies_as_empty() {
    let (base_url, _requests) = stub_server("200 OK", r#"{"data": []}"#);
    let api = ApiClient::new(base_url).unwrap();
    let params = Params::new().set("subjectCode", "MIST").set("courseNumber", "460");

    let outcome = api.dispatch(Endpoint::FindPrerequisites, &params);

    assert_eq!(outcome, Outcome::Empty);
}

#[test]
fn missing_data_field_classifies_as_empty() {
    let (base_url, _requests) = stub_server("200 OK", "{}");
    let api = ApiClient::new(base_url).unwrap();
    let params = Params::new().set("studentID", "42");

    let outcome = api.dispatch(Endpoint::GetEnrolledOfferings, &params);

    assert_eq!(outcome, Outcome::Empty);
}

#[test]
fn non_200_status_is_a_transport_failure() {
    // The error body is deliberately not JSON: non-200 responses are
    // opaque and must not be decoded.
    let (base_url, _requests) = stub_server("500 Internal Server Error", "oops");
    let api = ApiClient::new(base_url).unwrap();
    let params = Params::new().set("studentID", "42");

    let outcome = api.dispatch(Endpoint::GetEnrolledOfferings, &params);

    match outcome {
        Outcome::TransportFailure { status, .. } => assert_eq!(status, Some(500)),
        other => panic!("expected transport failure, got {other:?}"),
    }
}

#[test]
fn malformed_body_on_200_is_a_transport_failure() {
    let (base_url, _requests) = stub_server("200 OK", "not json at all");
    let api = ApiClient::new(base_url).unwrap();
    let params = Params::new().set("subjectCode", "MIST").set("courseNumber", "460");

    let outcome = api.dispatch(Endpoint::FindPrerequisites, &params);

    match outcome {
        Outcome::TransportFailure { status, detail } => {
            assert_eq!(status, Some(200));
            assert!(detail.contains("invalid response body"));
        }
        other => panic!("expected transport failure, got {other:?}"),
    }
}

#[test]
fn unreachable_server_is_a_transport_failure_without_status() {
    // Grab a free port, then close the listener so the connect fails.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let api = ApiClient::new(base_url).unwrap();
    let params = Params::new().set("username", "amy").set("password", "pw");

    let outcome = api.dispatch(Endpoint::ValidateUser, &params);

    match outcome {
        Outcome::TransportFailure { status, .. } => assert_eq!(status, None),
        other => panic!("expected transport failure, got {other:?}"),
    }
}
