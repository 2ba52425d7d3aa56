use uuid::Uuid;

/// Source of opaque identifiers for players, sessions and strokes.
pub trait IdAllocator {
    fn allocate(&mut self) -> Uuid;
}

/// Random v4 UUIDs. Collisions are negligible for the lifetime of a process.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidAllocator;

impl IdAllocator for UuidAllocator {
    fn allocate(&mut self) -> Uuid {
        Uuid::new_v4()
    }
}

impl<F> IdAllocator for F
where
    F: FnMut() -> Uuid,
{
    fn allocate(&mut self) -> Uuid {
        self()
    }
}
