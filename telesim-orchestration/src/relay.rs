//! Republicação dos eventos de um componente filho no bus do pai

use telesim_core::prelude::*;

/// Assina `child` e republica cada evento em `parent` com o prefixo do pai
pub(crate) fn relay(child: &EventBus, parent: &EventBus) -> ListenerId {
    let prefix = parent.owner().prefix().unwrap_or_default();
    let parent = parent.clone();
    child.subscribe(move |event: &LinkEvent| parent.forward(event.republish(prefix)))
}
