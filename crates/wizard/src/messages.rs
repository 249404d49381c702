//! User-facing strings.

pub const GARMENT_FAILED: &str = "Garment generation failed, please try again later.";
pub const TRY_ON_FAILED: &str = "Try-on generation failed. Cross-origin images or network \
     conditions are the likely cause; uploading a local image usually works.";
pub const API_KEY_MISSING: &str = "API key is not configured.";

pub const STEP_SELECT_PERSON: &str = "Choose model";
pub const STEP_SELECT_CLOTHING: &str = "Choose clothing";
pub const STEP_RESULT: &str = "Try-on result";

pub const LOADING_CONVERTING_PRESET: &str = "Preparing image...";
pub const LOADING_GENERATING_CLOTHING: &str = "Designing garment...";
pub const LOADING_GENERATING_TRY_ON: &str = "Generating try-on...";
