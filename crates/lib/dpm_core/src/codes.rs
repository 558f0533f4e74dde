//! Response codes returned by the backend in error bodies.
//!
//! A failed request carries a JSON array of `{ "id", "code" }` objects; `code`
//! is one of the constants below.

// generic
pub const UNAUTHORIZED: &str = "unauthorized";
pub const BAD_REQUEST: &str = "bad-request";
pub const DESCRIPTION_TOO_LONG: &str = "description.cannot-be-more-than-4000-characters";
pub const GROUP_CONTEXT_REQUIRED: &str = "group-context.required";

// email
pub const INVALID_EMAIL_FORMAT: &str = "email.is-not-format";
pub const EMAIL_CANNOT_BE_BLANK_OR_NULL: &str = "email.cannot-be-blank-or-null";

// super user
pub const USER_ALREADY_EXISTS: &str = "user.exists";
pub const USER_NOT_FOUND: &str = "user.not-found";

// group
pub const GROUP_NOT_FOUND: &str = "group.not-found";
pub const GROUP_ALREADY_EXISTS: &str = "group.exists";
pub const GROUP_NAME_CANNOT_BE_BLANK_OR_NULL: &str = "group.name.cannot-be-blank-or-null";
pub const GROUP_NAME_CANNOT_BE_LESS_THAN_THREE_CHARACTERS: &str =
    "group.name.cannot-be-less-than-three-characters";

// application
pub const APPLICATION_NOT_FOUND: &str = "application.not-found";
pub const APPLICATION_REQUIRES_GROUP_ASSOCIATION: &str = "application.requires-group-association";
pub const APPLICATION_CANNOT_UPDATE_GROUP_ASSOCIATION: &str =
    "application.cannot-update-group-association";
pub const APPLICATION_ALREADY_EXISTS: &str = "application.exists";
pub const APPLICATION_NAME_CANNOT_BE_BLANK_OR_NULL: &str =
    "application.name.cannot-be-blank-or-null";
pub const APPLICATION_NAME_CANNOT_BE_LESS_THAN_THREE_CHARACTERS: &str =
    "application.name.cannot-be-less-than-three-characters";
pub const APPLICATION_BIND_TOKEN_INVALID: &str = "application.bind-token.invalid";

// topic
pub const TOPIC_NOT_FOUND: &str = "topic.not-found";
pub const TOPIC_REQUIRES_GROUP_ASSOCIATION: &str = "topic.requires-group-association";
pub const TOPIC_CANNOT_UPDATE_GROUP_ASSOCIATION: &str = "topic.cannot-update-group-association";
pub const TOPIC_NAME_CANNOT_BE_BLANK_OR_NULL: &str = "topic.name.cannot-be-blank-or-null";
pub const TOPIC_NAME_CANNOT_BE_LESS_THAN_THREE_CHARACTERS: &str =
    "topic.name.cannot-be-less-than-three-characters";
pub const TOPIC_ALREADY_EXISTS: &str = "topic.exists";

// group member
pub const GROUP_MEMBERSHIP_NOT_FOUND: &str = "user.group-membership.not-found";
pub const GROUP_MEMBERSHIP_ALREADY_EXISTS: &str = "user.group-membership.exists";
pub const GROUP_MEMBERSHIP_REQUIRES_GROUP_ASSOCIATION: &str =
    "user.group-membership.requires-group-association";

// application permission
pub const APPLICATION_PERMISSION_NOT_FOUND: &str = "application.permission.not-found";
pub const APPLICATION_PERMISSION_ALREADY_EXISTS: &str = "application.permission.exists";
