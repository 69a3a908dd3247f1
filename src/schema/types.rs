// src/schema/types.rs

use serde::{Deserialize, Serialize};

/// Semantic input columns the pipeline reads from a scheduler export.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum InputField {
    JobId,
    State,
    WallclockLimit,
    RequestedNodes,
    Submit,
    Start,
    End,
    NodeList,
    Reservation,
}

pub const FIELD_COUNT: usize = 9;

impl InputField {
    pub const ALL: [InputField; FIELD_COUNT] = [
        InputField::JobId,
        InputField::State,
        InputField::WallclockLimit,
        InputField::RequestedNodes,
        InputField::Submit,
        InputField::Start,
        InputField::End,
        InputField::NodeList,
        InputField::Reservation,
    ];

    /// Name of the cleaned-table column this field feeds.
    pub fn canonical_name(&self) -> &'static str {
        match self {
            InputField::JobId => "job_id",
            InputField::State => "success",
            InputField::WallclockLimit => "requested_time",
            InputField::RequestedNodes => "requested_number_of_resources",
            InputField::Submit => "submission_time",
            InputField::Start => "starting_time",
            InputField::End => "finish_time",
            InputField::NodeList => "allocated_resources",
            InputField::Reservation => "purpose",
        }
    }

    pub(crate) fn slot(&self) -> usize {
        *self as usize
    }
}
