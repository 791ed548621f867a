// ============================================================================
// NETWORK MONITOR - Máquina de estados ONLINE/OFFLINE con override OFFLINE_MODE
// ============================================================================
// Eventos del navegador y probes activos alimentan señales; los suscriptores
// observan el estado en vez de consultarlo.
// ============================================================================

use std::cell::Cell;

use crate::state::reactivity::ReactiveState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkStatus {
    Online,
    Offline,
    Unknown,
}

/// Entradas de la máquina de estados
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectivitySignal {
    BrowserOnline,
    BrowserOffline,
    ProbeSucceeded,
    ProbeFailed,
}

impl ConnectivitySignal {
    fn target(self) -> NetworkStatus {
        match self {
            ConnectivitySignal::BrowserOnline | ConnectivitySignal::ProbeSucceeded => NetworkStatus::Online,
            ConnectivitySignal::BrowserOffline | ConnectivitySignal::ProbeFailed => NetworkStatus::Offline,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    WentOnline,
    WentOffline,
}

pub struct NetworkMonitor {
    status: ReactiveState<NetworkStatus>,
    offline_mode: ReactiveState<bool>,
    prompt_pending: Cell<bool>,
}

impl NetworkMonitor {
    pub fn new(initial: NetworkStatus) -> Self {
        Self {
            status: ReactiveState::new(initial),
            offline_mode: ReactiveState::new(false),
            prompt_pending: Cell::new(false),
        }
    }

    /// Aplica una señal; devuelve la transición que causó, si hubo
    pub fn apply(&self, signal: ConnectivitySignal) -> Option<Transition> {
        let next = signal.target();
        let previous = self.status.replace_if_changed(next)?;

        match next {
            NetworkStatus::Online => {
                log::info!("🌐 Red: ONLINE ({:?}, antes {:?})", signal, previous);
                self.prompt_pending.set(false);
                Some(Transition::WentOnline)
            }
            NetworkStatus::Offline => {
                log::warn!("📴 Red: OFFLINE ({:?})", signal);
                if !self.is_offline_mode() {
                    self.prompt_pending.set(true);
                }
                // Unknown -> Offline es el arranque, no una conexión perdida
                (previous == NetworkStatus::Online).then_some(Transition::WentOffline)
            }
            NetworkStatus::Unknown => None,
        }
    }

    pub fn current_status(&self) -> NetworkStatus {
        self.status.get()
    }

    pub fn is_online(&self) -> bool {
        matches!(self.current_status(), NetworkStatus::Online)
    }

    pub fn is_offline(&self) -> bool {
        matches!(self.current_status(), NetworkStatus::Offline)
    }

    pub fn is_offline_mode(&self) -> bool {
        self.offline_mode.get()
    }

    /// Solo se intentan llamadas remotas estando online y fuera de OFFLINE_MODE
    pub fn allows_remote(&self) -> bool {
        self.is_online() && !self.is_offline_mode()
    }

    /// Si hay que mostrar el prompt "¿trabajar offline?"
    pub fn offline_prompt_pending(&self) -> bool {
        self.prompt_pending.get()
    }

    /// El usuario aceptó el prompt. Se ignora si no hay prompt pendiente.
    pub fn confirm_offline_mode(&self) -> bool {
        if !self.prompt_pending.replace(false) {
            log::warn!("⚠️ Modo offline pedido sin prompt pendiente, ignorando");
            return false;
        }
        self.offline_mode.set(true);
        log::info!("📴 Modo offline activado por el usuario");
        true
    }

    pub fn dismiss_offline_prompt(&self) {
        self.prompt_pending.set(false);
    }

    pub fn exit_offline_mode(&self) {
        if self.offline_mode.replace_if_changed(false).is_some() {
            log::info!("🌐 Modo offline desactivado");
        }
    }

    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&NetworkStatus) + 'static,
    {
        self.status.subscribe(callback);
    }

    pub fn subscribe_offline_mode<F>(&self, callback: F)
    where
        F: Fn(&bool) + 'static,
    {
        self.offline_mode.subscribe(callback);
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new(NetworkStatus::Unknown)
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::{initial_status, start_monitoring};

#[cfg(target_arch = "wasm32")]
mod browser {
    use std::cell::Cell;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use web_sys::{window, Event};

    use super::{ConnectivitySignal, NetworkStatus};

    thread_local! {
        static MONITORING_STARTED: Cell<bool> = Cell::new(false);
    }

    /// `navigator.onLine` al arrancar
    pub fn initial_status() -> NetworkStatus {
        match window().map(|w| w.navigator().on_line()) {
            Some(true) => NetworkStatus::Online,
            Some(false) => NetworkStatus::Offline,
            None => NetworkStatus::Unknown,
        }
    }

    /// Registra los listeners `online`/`offline` de window una vez por página
    pub fn start_monitoring<F>(callback: F)
    where
        F: Fn(ConnectivitySignal) + 'static,
    {
        if MONITORING_STARTED.with(|started| started.replace(true)) {
            log::warn!("⚠️ NetworkMonitor: listeners ya registrados, ignorando");
            return;
        }

        let Some(window) = window() else {
            return;
        };

        let callback = std::rc::Rc::new(callback);

        let online_closure = Closure::wrap(Box::new({
            let callback = callback.clone();
            move |_event: Event| callback(ConnectivitySignal::BrowserOnline)
        }) as Box<dyn FnMut(Event)>);

        let offline_closure = Closure::wrap(Box::new({
            let callback = callback.clone();
            move |_event: Event| callback(ConnectivitySignal::BrowserOffline)
        }) as Box<dyn FnMut(Event)>);

        let _ = window.add_event_listener_with_callback("online", online_closure.as_ref().unchecked_ref());
        let _ = window.add_event_listener_with_callback("offline", offline_closure.as_ref().unchecked_ref());

        // Los listeners de window viven lo que vive la página
        online_closure.forget();
        offline_closure.forget();

        log::info!("✅ NetworkMonitor: listeners registrados");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn transitions_fire_only_on_change() {
        let monitor = NetworkMonitor::new(NetworkStatus::Online);
        assert_eq!(monitor.apply(ConnectivitySignal::ProbeSucceeded), None);
        assert_eq!(
            monitor.apply(ConnectivitySignal::BrowserOffline),
            Some(Transition::WentOffline)
        );
        assert_eq!(monitor.apply(ConnectivitySignal::ProbeFailed), None);
        assert_eq!(
            monitor.apply(ConnectivitySignal::ProbeSucceeded),
            Some(Transition::WentOnline)
        );
    }

    #[test]
    fn startup_offline_is_not_a_lost_connection() {
        let monitor = NetworkMonitor::default();
        assert_eq!(monitor.apply(ConnectivitySignal::BrowserOffline), None);
        assert!(monitor.is_offline());
        assert_eq!(
            monitor.apply(ConnectivitySignal::BrowserOnline),
            Some(Transition::WentOnline)
        );
    }

    #[test]
    fn offline_mode_requires_prompt_and_blocks_remote() {
        let monitor = NetworkMonitor::new(NetworkStatus::Online);
        assert!(!monitor.confirm_offline_mode());

        monitor.apply(ConnectivitySignal::BrowserOffline);
        assert!(monitor.offline_prompt_pending());
        assert!(monitor.confirm_offline_mode());

        // Un probe exitoso posterior no levanta el override
        monitor.apply(ConnectivitySignal::ProbeSucceeded);
        assert!(monitor.is_online());
        assert!(!monitor.allows_remote());

        monitor.exit_offline_mode();
        assert!(monitor.allows_remote());
    }

    #[test]
    fn subscribers_observe_status_changes() {
        let monitor = NetworkMonitor::new(NetworkStatus::Online);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        monitor.subscribe(move |status| sink.borrow_mut().push(*status));

        monitor.apply(ConnectivitySignal::ProbeFailed);
        monitor.apply(ConnectivitySignal::ProbeFailed);
        monitor.apply(ConnectivitySignal::BrowserOnline);

        assert_eq!(
            *seen.borrow(),
            vec![NetworkStatus::Offline, NetworkStatus::Online]
        );
    }
}
