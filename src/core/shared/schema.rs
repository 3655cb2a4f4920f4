diesel::table! {
    users (id) {
        id -> Uuid,
        username -> Text,
        email -> Text,
        first_name -> Text,
        last_name -> Text,
        password_hash -> Text,
        role -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    organizations (id) {
        id -> Uuid,
        owner_id -> Uuid,
        name -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    agents (id) {
        id -> Uuid,
        user_id -> Uuid,
        organization_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    categories (id) {
        id -> Uuid,
        organization_id -> Uuid,
        name -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    leads (id) {
        id -> Uuid,
        organization_id -> Uuid,
        agent_id -> Nullable<Uuid>,
        category_id -> Nullable<Uuid>,
        first_name -> Text,
        last_name -> Text,
        age -> Int4,
        email -> Nullable<Text>,
        phone_number -> Nullable<Text>,
        description -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(organizations -> users (owner_id));
diesel::joinable!(agents -> users (user_id));
diesel::joinable!(agents -> organizations (organization_id));
diesel::joinable!(categories -> organizations (organization_id));
diesel::joinable!(leads -> organizations (organization_id));
diesel::joinable!(leads -> agents (agent_id));
diesel::joinable!(leads -> categories (category_id));

diesel::allow_tables_to_appear_in_same_query!(users, organizations, agents, categories, leads);
