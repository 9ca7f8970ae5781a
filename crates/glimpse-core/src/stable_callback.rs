//! Memoized callbacks with explicit dependency lists.
//!
//! A [`StableCallback`] hands out a [`Callback`] whose identity only changes
//! when the dependency list changes. The body is stored separately from the
//! identity, so every handle ever issued (old or new) runs the latest body.

use smallvec::SmallVec;
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type Body<A, R> = Rc<RefCell<Box<dyn FnMut(A) -> R>>>;

/// One entry of a dependency list.
///
/// Comparison follows `Object.is`. Numbers compare by value whatever their
/// variant, so `Int(1)`, `Uint(1)` and `Float(1.0)` match. `NaN` matches `NaN`
/// and `0.0` does not match `-0.0`; an integer zero counts as `0.0`. Strings
/// compare by content and [`Dep::identity`] entries by pointer. Other kinds
/// never match each other.
#[derive(Clone)]
pub enum Dep {
    /// Absent value (`null`/`undefined`).
    Unit,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(Rc<str>),
    Ref(Rc<dyn Any>),
}

impl Dep {
    /// Dependency on the identity of a shared value rather than its contents.
    pub fn identity<T: 'static>(value: &Rc<T>) -> Self {
        Dep::Ref(Rc::clone(value) as Rc<dyn Any>)
    }

    pub fn same(&self, other: &Dep) -> bool {
        match (self, other) {
            (Dep::Unit, Dep::Unit) => true,
            (Dep::Bool(a), Dep::Bool(b)) => a == b,
            (Dep::Int(a), Dep::Int(b)) => a == b,
            (Dep::Uint(a), Dep::Uint(b)) => a == b,
            (Dep::Int(a), Dep::Uint(b)) | (Dep::Uint(b), Dep::Int(a)) => {
                i128::from(*a) == i128::from(*b)
            }
            (Dep::Float(a), Dep::Float(b)) => {
                (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits()
            }
            (Dep::Float(f), Dep::Int(i)) | (Dep::Int(i), Dep::Float(f)) => {
                float_matches_integer(*f, i128::from(*i))
            }
            (Dep::Float(f), Dep::Uint(u)) | (Dep::Uint(u), Dep::Float(f)) => {
                float_matches_integer(*f, i128::from(*u))
            }
            (Dep::Str(a), Dep::Str(b)) => a == b,
            (Dep::Ref(a), Dep::Ref(b)) => std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
            _ => false,
        }
    }
}

fn float_matches_integer(float: f64, integer: i128) -> bool {
    if float == 0.0 {
        return integer == 0 && float.is_sign_positive();
    }
    // Every i64/u64 lies within +-2^64, where the cast below is exact.
    float.is_finite()
        && float.fract() == 0.0
        && float.abs() <= u64::MAX as f64
        && float as i128 == integer
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dep::Unit => f.write_str("Unit"),
            Dep::Bool(v) => write!(f, "Bool({v})"),
            Dep::Int(v) => write!(f, "Int({v})"),
            Dep::Uint(v) => write!(f, "Uint({v})"),
            Dep::Float(v) => write!(f, "Float({v:?})"),
            Dep::Str(v) => write!(f, "Str({v:?})"),
            Dep::Ref(v) => write!(f, "Ref({:p})", Rc::as_ptr(v)),
        }
    }
}

impl From<()> for Dep {
    fn from(_: ()) -> Self {
        Dep::Unit
    }
}

impl From<bool> for Dep {
    fn from(value: bool) -> Self {
        Dep::Bool(value)
    }
}

impl From<i32> for Dep {
    fn from(value: i32) -> Self {
        Dep::Int(value as i64)
    }
}

impl From<i64> for Dep {
    fn from(value: i64) -> Self {
        Dep::Int(value)
    }
}

impl From<u32> for Dep {
    fn from(value: u32) -> Self {
        Dep::Uint(value as u64)
    }
}

impl From<u64> for Dep {
    fn from(value: u64) -> Self {
        Dep::Uint(value)
    }
}

impl From<usize> for Dep {
    fn from(value: usize) -> Self {
        Dep::Uint(value as u64)
    }
}

impl From<f32> for Dep {
    fn from(value: f32) -> Self {
        Dep::Float(value as f64)
    }
}

impl From<f64> for Dep {
    fn from(value: f64) -> Self {
        Dep::Float(value)
    }
}

impl From<&str> for Dep {
    fn from(value: &str) -> Self {
        Dep::Str(Rc::from(value))
    }
}

impl From<String> for Dep {
    fn from(value: String) -> Self {
        Dep::Str(Rc::from(value))
    }
}

impl From<Rc<str>> for Dep {
    fn from(value: Rc<str>) -> Self {
        Dep::Str(value)
    }
}

impl<T: Into<Dep>> From<Option<T>> for Dep {
    fn from(value: Option<T>) -> Self {
        value.map_or(Dep::Unit, Into::into)
    }
}

/// Returns `true` when `next` differs from `previous` pairwise or in length.
/// A missing previous list (first render) always counts as a change.
pub fn deps_changed(previous: Option<&[Dep]>, next: &[Dep]) -> bool {
    match previous {
        None => true,
        Some(previous) => {
            previous.len() != next.len()
                || previous.iter().zip(next).any(|(a, b)| !a.same(b))
        }
    }
}

struct CallbackIdentity {
    generation: u64,
}

/// Handle issued by [`StableCallback::update`].
///
/// Equality is identity: two handles are equal only if they were issued for
/// the same dependency list. Invoking any handle runs the latest body.
pub struct Callback<A, R = ()> {
    identity: Rc<CallbackIdentity>,
    body: Body<A, R>,
}

impl<A, R> Clone for Callback<A, R> {
    fn clone(&self) -> Self {
        Self {
            identity: Rc::clone(&self.identity),
            body: Rc::clone(&self.body),
        }
    }
}

impl<A, R> Callback<A, R> {
    /// Runs the latest body. Re-entering the same callback from its own body panics.
    pub fn call(&self, args: A) -> R {
        let mut body = self.body.borrow_mut();
        (&mut *body)(args)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.identity, &other.identity)
    }

    /// Number of identity changes that preceded this handle.
    pub fn generation(&self) -> u64 {
        self.identity.generation
    }
}

impl<A, R> PartialEq for Callback<A, R> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<A, R> Eq for Callback<A, R> {}

impl<A, R> fmt::Debug for Callback<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("generation", &self.identity.generation)
            .finish()
    }
}

/// Per-call-site slot that memoizes a callback against a dependency list.
pub struct StableCallback<A, R = ()> {
    body: Option<Body<A, R>>,
    current: Option<Callback<A, R>>,
    deps: Option<SmallVec<[Dep; 4]>>,
    generations: u64,
}

impl<A: 'static, R: 'static> StableCallback<A, R> {
    pub fn new() -> Self {
        Self {
            body: None,
            current: None,
            deps: None,
            generations: 0,
        }
    }

    /// Installs `body` as the latest logic and returns the handle for `deps`.
    ///
    /// The returned handle is the same one as last time when `deps` matches the
    /// previous list; otherwise a new identity is issued.
    pub fn update<I>(&mut self, deps: I, body: impl FnMut(A) -> R + 'static) -> Callback<A, R>
    where
        I: IntoIterator<Item = Dep>,
    {
        let deps: SmallVec<[Dep; 4]> = deps.into_iter().collect();
        let body: Box<dyn FnMut(A) -> R> = Box::new(body);
        let shared = match self.body.take() {
            Some(shared) => {
                *shared.borrow_mut() = body;
                shared
            }
            None => Rc::new(RefCell::new(body)),
        };
        self.body = Some(Rc::clone(&shared));

        if !deps_changed(self.deps.as_deref(), &deps) {
            if let Some(current) = &self.current {
                return current.clone();
            }
        }

        let generation = self.generations;
        self.generations += 1;
        log::trace!("stable callback identity changed (generation {generation})");
        let callback = Callback {
            identity: Rc::new(CallbackIdentity { generation }),
            body: shared,
        };
        self.current = Some(callback.clone());
        self.deps = Some(deps);
        callback
    }

    pub fn current(&self) -> Option<Callback<A, R>> {
        self.current.clone()
    }
}

impl<A: 'static, R: 'static> Default for StableCallback<A, R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_deps_follow_object_is() {
        assert!(Dep::from(f64::NAN).same(&Dep::from(f64::NAN)));
        assert!(!Dep::from(0.0f64).same(&Dep::from(-0.0f64)));
        assert!(Dep::from(1.5f64).same(&Dep::from(1.5f64)));
    }

    #[test]
    fn numbers_match_across_variants() {
        assert!(Dep::from(1i32).same(&Dep::from(1u32)));
        assert!(Dep::from(1u64).same(&Dep::from(1.0f64)));
        assert!(Dep::from(-3i64).same(&Dep::from(-3.0f32)));
        assert!(!Dep::from(-1i64).same(&Dep::from(u64::MAX)));
        assert!(!Dep::from(2i64).same(&Dep::from(2.5f64)));
        assert!(!Dep::from(0u32).same(&Dep::from(f64::NAN)));
    }

    #[test]
    fn integer_zero_matches_positive_zero_only() {
        assert!(Dep::from(0i32).same(&Dep::from(0.0f64)));
        assert!(Dep::from(0.0f32).same(&Dep::from(0usize)));
        assert!(!Dep::from(0i64).same(&Dep::from(-0.0f64)));
    }

    #[test]
    fn large_integers_are_not_rounded() {
        let big = (1u64 << 53) + 1;
        assert!(!Dep::from(big).same(&Dep::from(big as f64)));
        assert!(Dep::from(1u64 << 53).same(&Dep::from((1u64 << 53) as f64)));
    }

    #[test]
    fn other_kinds_never_match() {
        assert!(!Dep::Unit.same(&Dep::from(false)));
        assert!(!Dep::from(1i32).same(&Dep::from(true)));
        assert!(!Dep::from("1").same(&Dep::from(1i32)));
    }

    #[test]
    fn identity_deps_compare_by_pointer() {
        let a = Rc::new(String::from("quiz"));
        let b = Rc::new(String::from("quiz"));
        assert!(Dep::identity(&a).same(&Dep::identity(&a)));
        assert!(!Dep::identity(&a).same(&Dep::identity(&b)));
    }

    #[test]
    fn first_render_counts_as_change() {
        assert!(deps_changed(None, &[]));
        assert!(!deps_changed(Some(&[]), &[]));
        assert!(deps_changed(Some(&[Dep::from(1)]), &[Dep::from(1), Dep::from(2)]));
    }
}
