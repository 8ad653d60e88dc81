//! Prompt texts sent to the narrative provider.

use labsight_narrative::{GenerationProfile, NarrativeRequest};

/// Context for the clinician-support chat.
pub const SUPPORT_CONTEXT: &str = "You are a support AI designed to help medical professionals in \
diagnosing diseases. When given details by the patient, give the most likely disease. You must \
detect the disease and give reasons to support your findings";

/// Context for the patient-facing symptom diagnosis chat.
pub const DIAGNOSIS_CONTEXT: &str = "You are a helpful AI designed to answer medical questions \
concisely and accurately. When given symptoms by the patient, give the most likely diseases with \
their confidence percentage. If the confidence percent of the first diagnosed disease is greater \
than 70%, do not generate any more diagnoses. Also, give the timeline of when the patient should \
visit a doctor based on diagnosis severity. ALWAYS Clearly specify which doctor to visit - example \
urologist, dentist, cardiologist, neurologist etc";

/// Guard applied to PDF summaries.
pub const MEDICAL_ONLY_CONTEXT: &str = "Only process medical or health-related reports. If the \
document is not related to health or medicine, respond with: 'This document is not a medical \
report.' Focus on summarizing medical test results, diagnoses, prescriptions, or relevant health \
data.";

/// Instruction sent alongside a scan image.
pub const SCAN_INSTRUCTION: &str = "diagnose.";

/// Summary of an OCR'd lab report.
pub fn report_summary(text: &str) -> NarrativeRequest {
    NarrativeRequest::text(
        "",
        format!(
            "Summarize this medical report in simple terms and suggest possible diseases in points:\n\n{}",
            text
        ),
    )
    .with_profile(GenerationProfile::DIAGNOSIS)
}

/// Possible conditions for a list of formatted abnormal findings.
pub fn possible_conditions(findings: &[String]) -> NarrativeRequest {
    NarrativeRequest::text(
        "",
        format!(
            "Based on these abnormal blood test results, suggest possible medical conditions:\n{}",
            findings.join("\n")
        ),
    )
    .with_profile(GenerationProfile::DIAGNOSIS)
}

/// Plain-language summary of a PDF report.
pub fn pdf_summary(text: &str) -> NarrativeRequest {
    NarrativeRequest::text(
        MEDICAL_ONLY_CONTEXT,
        format!("Summarize this medical report in simple terms:\n\n{}", text),
    )
    .with_profile(GenerationProfile::REPORT)
}

/// Direct multimodal request for a scan image: the image and the bare
/// instruction, with no system context.
pub fn scan_image(mime_type: &str, data: Vec<u8>) -> NarrativeRequest {
    NarrativeRequest::image("", mime_type, data, SCAN_INSTRUCTION)
        .with_profile(GenerationProfile::DIAGNOSIS)
}
