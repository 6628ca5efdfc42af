// API client module: contains a small blocking HTTP client that talks to
// the course-recommender API. It is intentionally small and synchronous:
// each user action maps to exactly one request, and the caller blocks
// until the outcome is known.

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::interpret::{FlagKind, FlagRule, ResultShape};

/// One record returned by the API. Field order is preserved so tables
/// render in the order the server sent the columns.
pub type Row = serde_json::Map<String, Value>;

/// HTTP verbs the API accepts. The descriptor enumeration guarantees no
/// other verb can reach the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
}

/// The seven operations the API exposes. Each variant is a static
/// descriptor: path, verb, required parameters and result shape are all
/// pure functions of the variant, so a typo in an endpoint name is a
/// compile error rather than a dead menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    ValidateUser,
    FindCurrentSemesterCourseOfferings,
    FindPrerequisites,
    CheckPrerequisitesMet,
    EnrollStudent,
    GetEnrolledOfferings,
    DropStudent,
}

const ENROLL_FLAG: FlagRule = FlagRule {
    kind: FlagKind::BoolField {
        field: "EnrollmentSucceeded",
    },
    message_field: "EnrollmentResponse",
    success: "Enrollment confirmed.",
    failure: "Enrollment failed.",
};

const DROP_FLAG: FlagRule = FlagRule {
    kind: FlagKind::StatusEquals {
        field: "EnrollmentStatus",
        expected: "Dropped",
    },
    message_field: "EnrollmentResponse",
    success: "Course dropped.",
    failure: "Drop failed.",
};

impl Endpoint {
    /// All supported operations, in menu order.
    pub const ALL: [Endpoint; 7] = [
        Endpoint::ValidateUser,
        Endpoint::FindCurrentSemesterCourseOfferings,
        Endpoint::FindPrerequisites,
        Endpoint::CheckPrerequisitesMet,
        Endpoint::EnrollStudent,
        Endpoint::GetEnrolledOfferings,
        Endpoint::DropStudent,
    ];

    /// Path segment appended to the base URL.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::ValidateUser => "validate_user",
            Endpoint::FindCurrentSemesterCourseOfferings => {
                "find_current_semester_course_offerings"
            }
            Endpoint::FindPrerequisites => "find_prerequisites",
            Endpoint::CheckPrerequisitesMet => {
                "check_if_student_has_taken_all_prerequisites_for_course"
            }
            Endpoint::EnrollStudent => "enroll_student_in_course_offering",
            Endpoint::GetEnrolledOfferings => "get_student_enrolled_course_offerings",
            Endpoint::DropStudent => "drop_student_from_course_offering",
        }
    }

    pub fn verb(self) -> Verb {
        match self {
            Endpoint::EnrollStudent | Endpoint::DropStudent => Verb::Post,
            _ => Verb::Get,
        }
    }

    /// Parameters that must be present (and non-blank) before dispatch,
    /// in prompt order.
    pub fn required_params(self) -> &'static [&'static str] {
        match self {
            Endpoint::ValidateUser => &["username", "password"],
            Endpoint::FindCurrentSemesterCourseOfferings | Endpoint::FindPrerequisites => {
                &["subjectCode", "courseNumber"]
            }
            Endpoint::CheckPrerequisitesMet => &["studentID", "subjectCode", "courseNumber"],
            Endpoint::EnrollStudent | Endpoint::DropStudent => &["studentID", "courseOfferingID"],
            Endpoint::GetEnrolledOfferings => &["studentID"],
        }
    }

    /// How to read the rows this endpoint returns. See `interpret`.
    pub fn shape(self) -> ResultShape {
        match self {
            Endpoint::ValidateUser => ResultShape::CredentialCheck,
            Endpoint::FindCurrentSemesterCourseOfferings
            | Endpoint::FindPrerequisites
            | Endpoint::GetEnrolledOfferings => ResultShape::Listing,
            Endpoint::CheckPrerequisitesMet => ResultShape::MembershipCheck,
            Endpoint::EnrollStudent => ResultShape::ActionFlag(ENROLL_FLAG),
            Endpoint::DropStudent => ResultShape::ActionFlag(DROP_FLAG),
        }
    }

    /// Label shown in the operation menu.
    pub fn label(self) -> &'static str {
        match self {
            Endpoint::ValidateUser => "Validate user",
            Endpoint::FindCurrentSemesterCourseOfferings => {
                "Find current semester course offerings"
            }
            Endpoint::FindPrerequisites => "Find prerequisites for a course",
            Endpoint::CheckPrerequisitesMet => "Check prerequisites for a student",
            Endpoint::EnrollStudent => "Enroll student in course offering",
            Endpoint::GetEnrolledOfferings => "Get student's enrolled course offerings",
            Endpoint::DropStudent => "Drop student from course offering",
        }
    }

    /// Presence check run before dispatch. Missing or blank values are a
    /// client-side validation failure and never reach the server.
    pub fn check_params(self, params: &Params) -> Result<()> {
        for &name in self.required_params() {
            match params.get(name) {
                Some(value) if !value.trim().is_empty() => {}
                _ => bail!("missing required parameter: {name}"),
            }
        }
        Ok(())
    }
}

/// Ordered name/value pairs for one request. Values are kept as strings
/// because the API accepts everything as query-style parameters.
#[derive(Debug, Clone, Default)]
pub struct Params(Vec<(&'static str, String)>);

impl Params {
    pub fn new() -> Self {
        Params::default()
    }

    pub fn set(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.0.push((name, value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    fn pairs(&self) -> &[(&'static str, String)] {
        &self.0
    }
}

/// Classified result of one dispatch. Every failure mode ends up here;
/// `dispatch` never panics or returns a transport error to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// 200 with at least one row in `data`.
    Success(Vec<Row>),
    /// 200 with zero rows. Meaningful, not a failure; what it means
    /// depends on the endpoint's result shape.
    Empty,
    /// Non-200 status, or a request that produced no usable response
    /// (`status: None` when the server was never reached).
    TransportFailure {
        status: Option<u16>,
        detail: String,
    },
    /// 200 whose row data encodes a domain-level failure. Produced by
    /// the interpreter, never by the dispatcher.
    SemanticFailure(String),
}

/// Response envelope: `{"data": [...]}`. A missing `data` field decodes
/// as an empty sequence rather than an error.
#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Vec<Row>,
}

/// Blocking HTTP client holding the base URL of the course API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create an ApiClient configured from the environment variable
    /// `COURSE_API_URL`, falling back to the hosted API.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("COURSE_API_URL").unwrap_or_else(|_| {
            "https://mist460-course-recommender-apis-kenney.azurewebsites.net".into()
        });
        ApiClient::new(base_url)
    }

    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Issue exactly one request for `endpoint` and classify the
    /// response. Both verbs serialize `params` as query-string
    /// parameters; the API takes no JSON bodies.
    pub fn dispatch(&self, endpoint: Endpoint, params: &Params) -> Outcome {
        let url = format!("{}/{}", self.base_url, endpoint.path());
        let request = match endpoint.verb() {
            Verb::Get => self.client.get(&url),
            Verb::Post => self.client.post(&url),
        };

        let response = match request.query(params.pairs()).send() {
            Ok(response) => response,
            Err(e) => {
                return Outcome::TransportFailure {
                    status: e.status().map(|s| s.as_u16()),
                    detail: e.to_string(),
                }
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            return Outcome::TransportFailure {
                status: Some(status.as_u16()),
                detail: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            };
        }

        // A 200 with an undecodable body is still a transport failure,
        // not a panic.
        let envelope: Envelope = match response.json() {
            Ok(envelope) => envelope,
            Err(e) => {
                return Outcome::TransportFailure {
                    status: Some(status.as_u16()),
                    detail: format!("invalid response body: {e}"),
                }
            }
        };

        if envelope.data.is_empty() {
            Outcome::Empty
        } else {
            Outcome::Success(envelope.data)
        }
    }
}
