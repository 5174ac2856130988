pub mod histogram_face_matcher;
