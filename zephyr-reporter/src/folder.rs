// Copyright (c) The zephyr-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Finding the folder a test cycle is placed in.

use crate::{errors::RequestError, service::RemoteTestService};
use tracing::info;
use zephyr_metadata::{FolderId, FolderNode, FolderTree};

/// Searches `folders` and their descendants for a folder named exactly `name`.
///
/// The search is depth-first and pre-order: a folder is checked before its children, and the
/// children of a folder before its later siblings. The first match is returned.
pub fn find_folder<'a>(folders: &'a [FolderNode], name: &str) -> Option<&'a FolderNode> {
    folders.iter().find_map(|folder| {
        if folder.name == name {
            Some(folder)
        } else {
            find_folder(&folder.children, name)
        }
    })
}

/// Returns the id of the folder named `name` in `tree`, creating it at the root if it doesn't
/// exist.
pub fn resolve_or_create<S>(
    service: &S,
    tree: &FolderTree,
    name: &str,
) -> Result<FolderId, RequestError>
where
    S: RemoteTestService + ?Sized,
{
    if let Some(folder) = find_folder(&tree.children, name) {
        info!(folder = name, id = %folder.id, "found test cycle folder");
        return Ok(folder.id);
    }

    info!(folder = name, "test cycle folder not found, creating it");
    let id = service.create_folder(name)?;
    info!(folder = name, %id, "created test cycle folder");
    Ok(id)
}
