use nanoid::nanoid;

/// Fresh opaque URL-safe identifier (21 characters, nanoid alphabet).
pub fn new_id() -> String {
    nanoid!()
}
