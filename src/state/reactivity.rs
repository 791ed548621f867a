// ============================================================================
// REACTIVITY - Valores observables con notificación a suscriptores
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

type Callback<T> = Box<dyn Fn(&T)>;

/// Valor observable compartido. Los clones ven el mismo valor y suscriptores.
pub struct ReactiveState<T> {
    value: Rc<RefCell<T>>,
    subscribers: Rc<RefCell<Vec<Callback<T>>>>,
}

impl<T: Clone> ReactiveState<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Rc::new(RefCell::new(value)),
            subscribers: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Guarda el valor nuevo y notifica a los suscriptores
    pub fn set(&self, new_value: T) {
        *self.value.borrow_mut() = new_value;
        self.notify();
    }

    pub fn update<F>(&self, updater: F)
    where
        F: FnOnce(&mut T),
    {
        updater(&mut *self.value.borrow_mut());
        self.notify();
    }

    /// Los callbacks no deben suscribirse dentro de una notificación
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&T) + 'static,
    {
        self.subscribers.borrow_mut().push(Box::new(callback));
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    fn notify(&self) {
        // Copia primero para que los callbacks puedan leer o setear el estado
        let current = self.get();
        for callback in self.subscribers.borrow().iter() {
            callback(&current);
        }
    }
}

impl<T: Clone + PartialEq> ReactiveState<T> {
    /// Setea y notifica solo si el valor cambia; devuelve el valor anterior
    pub fn replace_if_changed(&self, new_value: T) -> Option<T> {
        let old = self.get();
        if old == new_value {
            return None;
        }
        self.set(new_value);
        Some(old)
    }
}

impl<T> Clone for ReactiveState<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            subscribers: self.subscribers.clone(),
        }
    }
}
