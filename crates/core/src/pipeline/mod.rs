pub mod authenticate_use_case;
pub mod login_outcome;
pub mod register_face_use_case;
