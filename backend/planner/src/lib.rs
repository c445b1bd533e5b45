pub mod extractor;
pub mod json_response;
pub mod planner;
pub mod prompts;
pub mod providers;

pub use extractor::{Extraction, InformationExtractor, EXTRACTION_APOLOGY};
pub use planner::ItineraryPlanner;
