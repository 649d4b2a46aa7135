//! Identity middleware.

use salvo::prelude::*;
use storefront_app::domain::owners::{SessionId, UserUuid};

use crate::{
    extensions::*,
    identity::{Identity, SESSION_ID_HEADER, USER_ID_HEADER},
};

/// Parse identity headers into the depot. Missing headers are not an error
/// here; routes that need an owner ask for one.
#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let identity = match parse_identity(req) {
        Ok(identity) => identity,
        Err(error) => {
            res.render(error);
            ctrl.skip_rest();

            return;
        }
    };

    if let Some(owner) = identity.owner() {
        tracing::Span::current().record("owner_kind", owner.kind());
    }

    depot.insert_identity(identity);

    ctrl.call_next(req, depot, res).await;
}

fn parse_identity(req: &Request) -> Result<Identity, StatusError> {
    let user = header_value(req, USER_ID_HEADER)?
        .map(|value| value.trim().parse::<UserUuid>())
        .transpose()
        .map_err(|_ignored| StatusError::bad_request().brief("x-user-id must be a UUID"))?;

    let session = header_value(req, SESSION_ID_HEADER)?
        .map(SessionId::parse)
        .transpose()
        .map_err(|error| StatusError::bad_request().brief(format!("Invalid x-session-id: {error}")))?;

    Ok(Identity { user, session })
}

fn header_value<'a>(req: &'a Request, name: &str) -> Result<Option<&'a str>, StatusError> {
    req.headers()
        .get(name)
        .map(|value| {
            value.to_str().map_err(|_ignored| {
                StatusError::bad_request().brief(format!("{name} must be visible ASCII"))
            })
        })
        .transpose()
}
