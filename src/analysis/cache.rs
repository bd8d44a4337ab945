//! Per-run descriptor cache.
//!
//! One descriptor is computed per class per run, however many entities
//! end up referring to it. The compute callback runs outside the map
//! borrow, so a computation may look up other classes in the same cache
//! without re-entering it for its own key.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::analysis::descriptor::TypeDescriptor;
use crate::model::ClassId;

#[derive(Default)]
pub struct DescriptorCache {
    map: RefCell<HashMap<ClassId, Rc<TypeDescriptor>>>,
}

impl DescriptorCache {
    pub fn new() -> DescriptorCache {
        DescriptorCache::default()
    }

    pub fn get(&self, class: ClassId) -> Option<Rc<TypeDescriptor>> {
        self.map.borrow().get(&class).map(Rc::clone)
    }

    pub fn is_defined(&self, class: ClassId) -> bool {
        self.map.borrow().contains_key(&class)
    }

    pub fn get_or_compute<F>(&self, class: ClassId, compute: F) -> Rc<TypeDescriptor>
    where
        F: FnOnce() -> TypeDescriptor,
    {
        if let Some(found) = self.get(class) {
            return found;
        }
        let computed = Rc::new(compute());
        Rc::clone(
            self.map
                .borrow_mut()
                .entry(class)
                .or_insert(computed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::classify::classify;
    use crate::model::testutil::*;
    use crate::report::Reporter;

    #[test]
    fn test_compute_runs_once_per_class() {
        let mut c = class("org.acme.Echo");
        c.superclass = Some("org.apache.tools.ant.Task".to_string());
        let mut classes = framework_classes();
        classes.push(c);
        let m = model(classes);
        let id = m.lookup("org.acme.Echo").unwrap();
        let reporter = Reporter::new();

        let cache = DescriptorCache::new();
        assert!(!cache.is_defined(id));
        let first = cache.get_or_compute(id, || classify(&m, &reporter, id));
        let second = cache.get_or_compute(id, || panic!("recomputed"));
        assert!(Rc::ptr_eq(&first, &second));
        assert!(cache.is_defined(id));
    }
}
