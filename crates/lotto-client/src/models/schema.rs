diesel::table! {
    draws (draw_no) {
        draw_no -> Integer,
        draw_date -> Date,
        n1 -> Integer,
        n2 -> Integer,
        n3 -> Integer,
        n4 -> Integer,
        n5 -> Integer,
        n6 -> Integer,
        bonus -> Integer,
        first_prize_amount -> BigInt,
        updated_at -> BigInt,
    }
}

diesel::table! {
    sync_meta (key) {
        key -> Text,
        value -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(draws, sync_meta);
