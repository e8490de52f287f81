use crate::error::{Result, RiggingError};
use crate::types::{ObjectMeta, OwnerReference};

/// An object other objects can be owned by.
pub trait Owner {
    fn api_version(&self) -> &str;
    fn kind(&self) -> &str;
    fn meta(&self) -> &ObjectMeta;
}

fn api_group(api_version: &str) -> &str {
    match api_version.rsplit_once('/') {
        Some((group, _)) => group,
        None => "",
    }
}

/// Record `owner` on `target`, replacing an existing reference to the same
/// owner. Cross-namespace ownership is refused.
pub fn set_owner_reference(owner: &impl Owner, target: &mut ObjectMeta) -> Result<()> {
    let meta = owner.meta();
    if meta.uid.is_empty() {
        return Err(RiggingError::OwnerReference(format!(
            "owner {} has no uid",
            meta.key()
        )));
    }
    if meta.namespace != target.namespace {
        return Err(RiggingError::OwnerReference(format!(
            "owner {} and {} are in different namespaces",
            meta.key(),
            target.key()
        )));
    }

    let reference = OwnerReference {
        api_version: owner.api_version().to_string(),
        kind: owner.kind().to_string(),
        name: meta.name.clone(),
        uid: meta.uid.clone(),
        controller: None,
        block_owner_deletion: None,
    };
    let group = api_group(owner.api_version());
    match target.owner_references.iter_mut().find(|r| {
        api_group(&r.api_version) == group && r.kind == reference.kind && r.name == reference.name
    }) {
        Some(existing) => *existing = reference,
        None => target.owner_references.push(reference),
    }
    Ok(())
}
