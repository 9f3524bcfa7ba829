pub mod accounts;
pub mod admin;
pub mod applicant;
pub mod comments;
pub mod notify;
pub mod submissions;
