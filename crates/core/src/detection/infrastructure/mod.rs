pub mod cascade_face_locator;
pub mod cascade_xml;
pub mod haar_cascade;
pub mod integral_image;
pub mod math;
pub mod rectangle_grouper;
