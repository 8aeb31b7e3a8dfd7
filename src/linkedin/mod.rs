mod crawler;

pub use crawler::LinkedInCrawler;

use serde::Serialize;
use std::fmt;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedInProfile {
    pub name: Option<String>,
    pub headline: Option<String>,
    pub location: Option<String>,
    pub about: Option<String>,
    pub experience: Vec<String>,
    pub education: Vec<String>,
    pub page_title: Option<String>,
}

impl LinkedInProfile {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
    }
}

impl fmt::Display for LinkedInProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = |v: &Option<String>| v.clone().unwrap_or_else(|| "None".to_string());

        writeln!(f, "Name            : {}", field(&self.name))?;
        writeln!(f, "Headline        : {}", field(&self.headline))?;
        writeln!(f, "Location        : {}", field(&self.location))?;
        writeln!(f, "About           : {}", field(&self.about))?;
        writeln!(f, "Experience      : ")?;
        for e in &self.experience {
            writeln!(f, "> {}", e)?;
        }
        writeln!(f, "Education       : ")?;
        for e in &self.education {
            writeln!(f, "> {}", e)?;
        }

        Ok(())
    }
}
