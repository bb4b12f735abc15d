//! Guided resume builder: an eight-step wizard whose output is the plain
//! labelled resume text handed to the AI collaborator. Step advancement is
//! validated per step; the final step hands off to credit consumption and
//! generation in the store.

use serde::{Deserialize, Serialize};

use crate::models::user::User;
use crate::providers::GenerationRequest;

/// Fallback target description used when the builder has no job description
/// to tailor against.
pub const GENERIC_JOB_DESCRIPTION: &str = "We are looking for a motivated individual with strong technical skills and good communication abilities. The ideal candidate should have relevant education and experience in their field.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Fresher,
    Student,
    Experienced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderStep {
    ExperienceLevel,
    Contact,
    Education,
    WorkExperience,
    Projects,
    Skills,
    Additional,
    Review,
}

pub const BUILDER_STEPS: [BuilderStep; 8] = [
    BuilderStep::ExperienceLevel,
    BuilderStep::Contact,
    BuilderStep::Education,
    BuilderStep::WorkExperience,
    BuilderStep::Projects,
    BuilderStep::Skills,
    BuilderStep::Additional,
    BuilderStep::Review,
];

impl BuilderStep {
    pub fn title(&self) -> &'static str {
        match self {
            BuilderStep::ExperienceLevel => "Experience Level",
            BuilderStep::Contact => "Contact Details",
            BuilderStep::Education => "Education",
            BuilderStep::WorkExperience => "Work Experience",
            BuilderStep::Projects => "Projects",
            BuilderStep::Skills => "Skills",
            BuilderStep::Additional => "Additional Sections",
            BuilderStep::Review => "Review & Generate",
        }
    }

    fn index(&self) -> usize {
        BUILDER_STEPS.iter().position(|s| s == self).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactDetails {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub linkedin: String,
    pub github: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EducationEntry {
    pub degree: String,
    pub school: String,
    pub year: String,
    pub cgpa: String,
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkExperienceEntry {
    pub role: String,
    pub company: String,
    pub year: String,
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectEntry {
    pub title: String,
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkillCategory {
    pub name: String,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdditionalSections {
    pub include_certifications: bool,
    pub include_achievements: bool,
}

/// The whole wizard. Fields are public form state; the methods own step
/// movement and the text assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct GuidedBuilderForm {
    pub step: BuilderStep,
    pub experience_level: ExperienceLevel,
    pub contact: ContactDetails,
    pub education: Vec<EducationEntry>,
    pub work_experience: Vec<WorkExperienceEntry>,
    pub projects: Vec<ProjectEntry>,
    pub skills: Vec<SkillCategory>,
    pub certifications: Vec<String>,
    pub achievements: Vec<String>,
    pub additional: AdditionalSections,
}

impl GuidedBuilderForm {
    /// Fresh form, contact details prefilled from the signed-in user when
    /// one is available.
    pub fn new(user: Option<&User>) -> Self {
        let contact = match user {
            Some(u) => ContactDetails {
                full_name: u.name.clone(),
                email: u.email.clone(),
                phone: u.phone.clone().unwrap_or_default(),
                location: String::new(),
                linkedin: u.linkedin.clone().unwrap_or_default(),
                github: u.github.clone().unwrap_or_default(),
            },
            None => ContactDetails::default(),
        };

        GuidedBuilderForm {
            step: BuilderStep::ExperienceLevel,
            experience_level: ExperienceLevel::Fresher,
            contact,
            education: vec![EducationEntry::default()],
            work_experience: vec![WorkExperienceEntry {
                bullets: vec![String::new()],
                ..Default::default()
            }],
            projects: vec![ProjectEntry {
                bullets: vec![String::new()],
                ..Default::default()
            }],
            skills: vec![
                SkillCategory {
                    name: "Programming Languages".to_string(),
                    skills: vec![String::new()],
                },
                SkillCategory {
                    name: "Frameworks & Libraries".to_string(),
                    skills: vec![String::new()],
                },
                SkillCategory {
                    name: "Tools & Technologies".to_string(),
                    skills: vec![String::new()],
                },
                SkillCategory {
                    name: "Soft Skills".to_string(),
                    skills: vec![String::new()],
                },
            ],
            certifications: vec![String::new()],
            achievements: vec![String::new()],
            additional: AdditionalSections::default(),
        }
    }

    /// Per-step advance gate. Work experience, projects, and the optional
    /// sections may be left empty.
    pub fn can_proceed(&self) -> bool {
        match self.step {
            BuilderStep::ExperienceLevel => true,
            BuilderStep::Contact => {
                !self.contact.full_name.is_empty() && !self.contact.email.is_empty()
            }
            BuilderStep::Education => self
                .education
                .iter()
                .any(|e| !e.degree.is_empty() && !e.school.is_empty()),
            BuilderStep::Skills => self
                .skills
                .iter()
                .any(|cat| cat.skills.iter().any(|s| !s.trim().is_empty())),
            BuilderStep::WorkExperience
            | BuilderStep::Projects
            | BuilderStep::Additional
            | BuilderStep::Review => true,
        }
    }

    /// Moves forward one step when the current one validates. Returns false
    /// at the review step; generating is the store's job, not the form's.
    pub fn advance(&mut self) -> bool {
        if !self.can_proceed() {
            return false;
        }
        let idx = self.step.index();
        if idx + 1 < BUILDER_STEPS.len() {
            self.step = BUILDER_STEPS[idx + 1];
            true
        } else {
            false
        }
    }

    pub fn back(&mut self) -> bool {
        let idx = self.step.index();
        if idx > 0 {
            self.step = BUILDER_STEPS[idx - 1];
            true
        } else {
            false
        }
    }

    /// Assembles the labelled plain-text resume the AI collaborator
    /// consumes. Entries are filtered on trimmed emptiness but emitted
    /// untrimmed, preserving whatever spacing the user typed.
    pub fn resume_text(&self) -> String {
        let mut text = format!("Name: {}\n", self.contact.full_name);
        text.push_str(&format!("Email: {}\n", self.contact.email));
        text.push_str(&format!("Phone: {}\n", self.contact.phone));
        if !self.contact.location.is_empty() {
            text.push_str(&format!("Location: {}\n", self.contact.location));
        }
        if !self.contact.linkedin.is_empty() {
            text.push_str(&format!("LinkedIn: {}\n", self.contact.linkedin));
        }
        if !self.contact.github.is_empty() {
            text.push_str(&format!("GitHub: {}\n", self.contact.github));
        }

        text.push_str("\nEDUCATION:\n");
        for edu in &self.education {
            if !edu.degree.trim().is_empty() && !edu.school.trim().is_empty() {
                text.push_str(&format!("{} from {} ({})", edu.degree, edu.school, edu.year));
                if !edu.cgpa.trim().is_empty() {
                    text.push_str(&format!(" - CGPA: {}", edu.cgpa));
                }
                if !edu.location.trim().is_empty() {
                    text.push_str(&format!(" - {}", edu.location));
                }
                text.push('\n');
            }
        }

        let has_work = self
            .work_experience
            .iter()
            .any(|e| !e.role.trim().is_empty() && !e.company.trim().is_empty());
        if has_work {
            text.push_str("\nWORK EXPERIENCE:\n");
            for exp in &self.work_experience {
                if !exp.role.trim().is_empty() && !exp.company.trim().is_empty() {
                    text.push_str(&format!("{} at {} ({})\n", exp.role, exp.company, exp.year));
                    for bullet in &exp.bullets {
                        if !bullet.trim().is_empty() {
                            text.push_str(&format!("\u{2022} {bullet}\n"));
                        }
                    }
                }
            }
        }

        let has_projects = self.projects.iter().any(|p| !p.title.trim().is_empty());
        if has_projects {
            text.push_str("\nPROJECTS:\n");
            for project in &self.projects {
                if !project.title.trim().is_empty() {
                    text.push_str(&format!("{}\n", project.title));
                    for bullet in &project.bullets {
                        if !bullet.trim().is_empty() {
                            text.push_str(&format!("\u{2022} {bullet}\n"));
                        }
                    }
                }
            }
        }

        text.push_str("\nSKILLS:\n");
        for category in &self.skills {
            let filtered: Vec<&str> = category
                .skills
                .iter()
                .map(|s| s.as_str())
                .filter(|s| !s.trim().is_empty())
                .collect();
            if !filtered.is_empty() {
                text.push_str(&format!("{}: {}\n", category.name, filtered.join(", ")));
            }
        }

        if self.additional.include_certifications
            && self.certifications.iter().any(|c| !c.trim().is_empty())
        {
            text.push_str("\nCERTIFICATIONS:\n");
            for cert in &self.certifications {
                if !cert.trim().is_empty() {
                    text.push_str(&format!("\u{2022} {cert}\n"));
                }
            }
        }

        if self.additional.include_achievements
            && self.achievements.iter().any(|a| !a.trim().is_empty())
        {
            text.push_str("\nACHIEVEMENTS:\n");
            for achievement in &self.achievements {
                if !achievement.trim().is_empty() {
                    text.push_str(&format!("\u{2022} {achievement}\n"));
                }
            }
        }

        text
    }

    /// Request payload for the AI collaborator, using the generic target
    /// description because the guided path has no job description input.
    pub fn generation_request(&self) -> GenerationRequest {
        GenerationRequest {
            resume_text: self.resume_text(),
            target_description: GENERIC_JOB_DESCRIPTION.to_string(),
            experience_level: self.experience_level,
            full_name: self.contact.full_name.clone(),
            email: self.contact.email.clone(),
            phone: self.contact.phone.clone(),
            linkedin: self.contact.linkedin.clone(),
            github: self.contact.github.clone(),
        }
    }
}
