use crate::host::{GroupId, HostError, TabHost, TabId, TabPosition, TabUpdate};

/// Work the panel hands to the host's background side (see [`super::TabSidebar::take_outbound`]).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "camelCase"))]
pub enum BackgroundRequest {
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    MoveGroupToNewWindow { tab_id: TabId, group_id: GroupId },
}

/// Fulfil a [`BackgroundRequest`].
///
/// Moving a group to a new window: create the window, move the group into it, re-activate the
/// tab the request came from and close the window's placeholder tab.
///
/// # Errors
/// Returns the first host failure; earlier steps are not rolled back.
pub fn handle_background_request(
    host: &mut dyn TabHost,
    request: &BackgroundRequest,
) -> Result<(), HostError> {
    match *request {
        BackgroundRequest::MoveGroupToNewWindow { tab_id, group_id } => {
            let window = host.create_window(None)?;
            let placeholders: Vec<TabId> = window.tabs.iter().map(|t| t.id).collect();
            host.move_group(group_id, Some(window.id), TabPosition::End)?;
            host.update_tab(
                tab_id,
                TabUpdate {
                    active: Some(true),
                    ..Default::default()
                },
            )?;
            host.remove_tabs(&placeholders)?;
            log::debug!(
                "group {} moved to new window {}",
                group_id.0,
                window.id.0
            );
            Ok(())
        }
    }
}
