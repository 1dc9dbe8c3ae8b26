//! testaudit-report: Self-contained HTML views of validity data.

pub mod html;

pub use html::{
    generate_assessment_html, generate_report_html, write_assessment_html, write_html_report,
};
