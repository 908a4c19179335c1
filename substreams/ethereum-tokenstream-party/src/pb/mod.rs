// @generated
pub mod tokenstream {
    // @@protoc_insertion_point(attribute:tokenstream.v1)
    pub mod v1 {
        include!("tokenstream.v1.rs");
        // @@protoc_insertion_point(tokenstream.v1)
    }
}
