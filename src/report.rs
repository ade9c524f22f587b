use serde::{de, Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::process::ExitCode;

use crate::error::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Internal,
    BadConfig,
    Document,
}

impl Status {
    fn code(&self) -> u8 {
        match self {
            Status::Ok => 0,
            Status::Internal => 1,
            Status::BadConfig => 2,
            Status::Document => 3,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Status::Ok => "ok",
            Status::Internal => "internal error",
            Status::BadConfig => "configuration error",
            Status::Document => "document error",
        };
        f.write_str(name)
    }
}

impl Serialize for Status {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.code())
    }
}

struct StatusCodeVisitor;

impl<'de> de::Visitor<'de> for StatusCodeVisitor {
    type Value = Status;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a run status code")
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        match v {
            0 => Ok(Status::Ok),
            1 => Ok(Status::Internal),
            2 => Ok(Status::BadConfig),
            3 => Ok(Status::Document),
            value => Err(de::Error::custom(format!("unknown status code {value}"))),
        }
    }
}

impl<'de> de::Deserialize<'de> for Status {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_u8(StatusCodeVisitor)
    }
}

/// Outcome of one run, printed on stdout by the binaries.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPayload {
    pub status: Status,
    pub body: Value,
}

impl ReportPayload {
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.status.code())
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| format!("{{\"status\": {}}}", self.status.code()))
    }
}

pub fn make_report(result: Result<Value, ServiceError>) -> ReportPayload {
    match result {
        Err(err) => ReportPayload {
            status: err.status,
            body: Value::String(err.msg),
        },
        Ok(body) => ReportPayload {
            status: Status::Ok,
            body,
        },
    }
}
