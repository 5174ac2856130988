pub mod face_locator;
pub mod primary_face;
