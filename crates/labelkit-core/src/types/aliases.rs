//! Type aliases for commonly used complex types.
//!
//! The export pipeline shares its state and cancel flag with whoever started
//! it, and reports progress through boxed callbacks. Naming those types keeps
//! the signatures readable.

use parking_lot::Mutex;
use std::sync::Arc;

/// A thread-safe, mutex-protected wrapper for cross-task sharing.
///
/// Uses `parking_lot::Mutex` for better performance than `std::sync::Mutex`.
pub type ThreadSafe<T> = Arc<Mutex<T>>;

/// A thread-safe vector.
pub type ThreadSafeVec<T> = Arc<Mutex<Vec<T>>>;

/// A callback that receives a single parameter.
pub type DataCallback<T> = Box<dyn Fn(T) + Send + Sync>;

/// Create a new thread-safe value.
#[inline]
pub fn thread_safe<T>(value: T) -> ThreadSafe<T> {
    Arc::new(Mutex::new(value))
}

/// Create a new empty thread-safe vector.
#[inline]
pub fn thread_safe_vec<T>() -> ThreadSafeVec<T> {
    Arc::new(Mutex::new(Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_safe_creation() {
        let value: ThreadSafe<i32> = thread_safe(42);
        assert_eq!(*value.lock(), 42);

        *value.lock() = 100;
        assert_eq!(*value.lock(), 100);
    }

    #[test]
    fn test_thread_safe_vec() {
        let vec: ThreadSafeVec<String> = thread_safe_vec();
        vec.lock().push("item1".to_string());
        vec.lock().push("item2".to_string());

        assert_eq!(vec.lock().len(), 2);
    }

    #[test]
    fn test_data_callback() {
        let seen = thread_safe_vec();
        let sink = seen.clone();
        let callback: DataCallback<u32> = Box::new(move |v| sink.lock().push(v));
        callback(3);
        callback(4);
        assert_eq!(*seen.lock(), vec![3, 4]);
    }
}
