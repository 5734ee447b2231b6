//! Wardgate Clinic: permission-gated clinic operations and the notes
//! summarization client.

pub mod service;
pub mod summarize;

pub use service::{
    ClinicService, DashboardStats, NewAppointment, NewMedicalRecord, NewPatient, NewStaff,
};
pub use summarize::{GeminiSummarizer, Summarizer, SummarizerConfig};
