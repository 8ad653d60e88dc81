//! Reference vocabulary — label synonyms and the clinical specialty catalogue.
//!
//! Built once at startup and shared read-only (`Arc<Vocabulary>`). Components
//! take the tables by reference so tests can inject their own.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// Column headers that label the measured value.
pub const VALUE_KEYWORDS: &[&str] = &["Value", "Result", "Reading", "Test Value"];

/// Column headers that label the reference range.
pub const REFERENCE_KEYWORDS: &[&str] = &["Reference Range", "Normal Range", "Range", "Ref Range"];

/// Column headers that label the unit.
pub const UNIT_KEYWORDS: &[&str] = &["Unit", "Units", "UOM"];

/// Specialty names matched in diagnosis narratives.
pub const DOCTOR_TYPES: &[&str] = &[
    // General practitioners & primary care
    "General Practitioner", "Primary Care Physician", "Family Physician", "Internist", "General Doctor",
    "Primary Care Doctor", "Internal Medicine Doctor", "General Medicine Doctor",
    // Medical specialists
    "Cardiologist", "Heart Specialist", "Interventional Cardiologist", "Electrophysiologist",
    "Pulmonologist", "Lung Specialist", "Respiratory Doctor",
    "Nephrologist", "Kidney Specialist",
    "Hepatologist", "Liver Specialist",
    "Gastroenterologist", "GI Doctor", "Stomach Doctor", "Digestive Specialist",
    "Endocrinologist", "Hormone Specialist", "Diabetes Doctor",
    "Rheumatologist", "Arthritis Specialist", "Joint Doctor",
    "Hematologist", "Blood Specialist",
    "Oncologist", "Cancer Specialist",
    "Neurologist", "Brain Specialist", "Nervous System Doctor",
    "Psychiatrist", "Mental Health Doctor", "Psychosomatic Medicine Specialist",
    "Psychologist", "Mental Health Therapist", "Clinical Psychologist", "Counseling Psychologist",
    "Urologist", "Urology Specialist", "Urinary Tract Doctor", "Men’s Health Specialist",
    "Gynecologist", "OB-GYN", "Women’s Health Specialist", "Obstetrician",
    "Reproductive Endocrinologist", "Fertility Specialist",
    "Geriatrician", "Elderly Care Specialist",
    "Sleep Medicine Specialist", "Sleep Doctor",
    "Pain Management Specialist", "Pain Doctor",
    // Surgeons
    "Surgeon", "General Surgeon", "Surgical Specialist",
    "Neurosurgeon", "Brain Surgeon", "Spinal Surgeon",
    "Orthopedic Surgeon", "Bone Specialist", "Joint Surgeon", "Sports Medicine Surgeon",
    "Hand Surgeon", "Hand & Microsurgery Specialist",
    "Shoulder & Elbow Surgeon",
    "Spine Specialist", "Spinal Surgeon",
    "Plastic Surgeon", "Cosmetic Surgeon",
    "Facial Plastic & Reconstructive Surgeon",
    "Colorectal Surgeon", "Bowel Surgeon",
    "Vascular Surgeon", "Blood Vessel Surgeon",
    "Cardiothoracic Surgeon", "Heart & Lung Surgeon",
    "Pediatric Surgeon", "Children’s Surgeon",
    "Head & Neck Surgeon", "ENT Surgeon",
    "Oral Surgeon", "Maxillofacial Surgeon", "Jaw Surgeon",
    "Bariatric Surgeon", "Weight Loss Surgeon",
    "Oculoplastic Surgeon", "Eye Plastic Surgeon",
    "Laryngologist", "Throat Specialist",
    "Endodontist", "Root Canal Specialist",
    "Periodontist", "Gum Specialist",
    "Prosthodontist", "Dental Prosthetics Specialist",
    // Eye, ear, nose & throat
    "Ophthalmologist", "Eye Doctor", "Retina Specialist", "Cornea Specialist", "Glaucoma Specialist",
    "Neuro-Ophthalmologist", "Vision Specialist",
    "Optometrist", "Eye Care Specialist",
    "ENT Doctor", "Ear, Nose & Throat Doctor", "Otolaryngologist",
    "Sinus Surgeon", "Rhinologist",
    "Audiologist", "Hearing Specialist",
    "Pediatric Otolaryngologist", "Children’s ENT Doctor",
    // Pediatric specialists
    "Pediatrician", "Child Doctor", "Kids’ Doctor",
    "Pediatric Cardiologist", "Children’s Heart Doctor",
    "Pediatric Endocrinologist", "Children’s Hormone Specialist",
    "Pediatric Gastroenterologist", "Children’s Digestive Doctor",
    "Pediatric Neurologist", "Children’s Brain Specialist",
    "Pediatric Oncologist", "Children’s Cancer Specialist",
    "Pediatric Surgeon", "Children’s Surgeon",
    "Pediatric Orthopedic Surgeon", "Children’s Bone Specialist",
    "Pediatric Emergency Medicine Specialist",
    "Pediatric Urologist", "Children’s Urinary Tract Doctor",
    // Dental
    "Dentist", "General Dentist", "Family Dentist",
    "Orthodontist", "Braces Specialist",
    "Pediatric Dentist", "Children’s Dentist",
    "Oral Surgeon", "Mouth Surgeon",
    // Alternative & complementary
    "Chiropractor", "Spinal Adjustment Specialist",
    "Acupuncturist", "Chinese Medicine Specialist",
    "Homeopath", "Natural Medicine Doctor",
    "Naturopath", "Holistic Medicine Practitioner",
    "Herbalist", "Herbal Medicine Doctor",
    // Rehabilitation & therapy
    "Physiatrist", "Rehabilitation Specialist",
    "Physical Therapist", "Physiotherapist",
    "Occupational Therapist", "Work Injury Specialist",
    "Speech Therapist", "Speech-Language Pathologist",
    "Addiction Specialist", "Substance Abuse Doctor",
    // Emergency & critical care
    "Emergency Medicine Physician", "ER Doctor",
    "Critical Care Specialist", "Intensive Care Doctor",
    "Pulmonary Diseases and Critical Care Medicine Specialist",
    "Emergency Services", "Emergency Room",
    // Radiology & imaging
    "Radiologist", "Imaging Specialist",
    "Diagnostic Radiologist", "Medical Imaging Doctor",
    "Interventional Radiologist", "Image-Guided Procedure Specialist",
    // Other medical professionals
    "Physician Assistant", "PA", "Advanced Practice Clinician",
    "Nurse Practitioner", "NP", "Advanced Practice Registered Nurse",
    "Midwife", "Certified Nurse Midwife",
    "Women’s Health Nurse Practitioner",
    "Family Nurse Practitioner", "FNP",
    "Adult Nurse Practitioner",
    "Pediatric Nurse Practitioner",
    "Family Psychiatric & Mental Health Nurse Practitioner",
    "Travel Medicine Specialist", "Travel Doctor",
];

/// Immutable lookup tables shared by the matcher, detector and tagger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    pub value_keywords: Vec<String>,
    pub reference_keywords: Vec<String>,
    #[serde(default = "default_unit_keywords")]
    pub unit_keywords: Vec<String>,
    pub doctor_types: Vec<String>,
}

fn default_unit_keywords() -> Vec<String> {
    to_owned(UNIT_KEYWORDS)
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new(
            to_owned(VALUE_KEYWORDS),
            to_owned(REFERENCE_KEYWORDS),
            to_owned(UNIT_KEYWORDS),
            to_owned(DOCTOR_TYPES),
        )
    }
}

impl Vocabulary {
    /// Build a vocabulary. Repeated entries keep their first position only.
    pub fn new(
        value_keywords: Vec<String>,
        reference_keywords: Vec<String>,
        unit_keywords: Vec<String>,
        doctor_types: Vec<String>,
    ) -> Self {
        Self {
            value_keywords: dedup_ordered(value_keywords),
            reference_keywords: dedup_ordered(reference_keywords),
            unit_keywords: dedup_ordered(unit_keywords),
            doctor_types: dedup_ordered(doctor_types),
        }
    }

    /// Load tables from a JSON file with the same shape as this struct.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let parsed: Vocabulary = serde_json::from_str(&raw)?;
        if parsed.doctor_types.is_empty() {
            return Err(Error::Vocabulary(format!(
                "{} defines no doctor types",
                path.display()
            )));
        }
        let vocabulary = Self::new(
            parsed.value_keywords,
            parsed.reference_keywords,
            parsed.unit_keywords,
            parsed.doctor_types,
        );
        info!(
            "Loaded vocabulary from {} ({} doctor types)",
            path.display(),
            vocabulary.doctor_types.len()
        );
        Ok(vocabulary)
    }

    /// Built-in tables, or the override file when one is configured.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

fn dedup_ordered(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}
