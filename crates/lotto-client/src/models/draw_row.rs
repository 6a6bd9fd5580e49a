use chrono::NaiveDate;
use diesel::prelude::*;
use lotto_draw::{Draw, DrawError};

/// Persisted draw. `updated_at` is epoch millis of the last upsert.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::models::schema::draws)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DrawRow {
    pub draw_no: i32,
    pub draw_date: NaiveDate,
    pub n1: i32,
    pub n2: i32,
    pub n3: i32,
    pub n4: i32,
    pub n5: i32,
    pub n6: i32,
    pub bonus: i32,
    pub first_prize_amount: i64,
    pub updated_at: i64,
}

impl DrawRow {
    /// Fails when the draw number or prize does not fit the column type.
    pub fn from_draw(draw: &Draw, updated_at: i64) -> anyhow::Result<Self> {
        let draw_no = i32::try_from(draw.draw_no())
            .map_err(|_e| anyhow::anyhow!("Draw number {} does not fit the draws key", draw.draw_no()))?;
        let first_prize_amount = i64::try_from(draw.first_prize_amount()).map_err(|_e| {
            anyhow::anyhow!(
                "Prize {} of draw {} does not fit the column",
                draw.first_prize_amount(),
                draw.draw_no()
            )
        })?;
        let [n1, n2, n3, n4, n5, n6] = draw.numbers().map(i32::from);
        Ok(Self {
            draw_no,
            draw_date: draw.draw_date(),
            n1,
            n2,
            n3,
            n4,
            n5,
            n6,
            bonus: i32::from(draw.bonus()),
            first_prize_amount,
            updated_at,
        })
    }

    pub fn numbers(&self) -> [i32; 6] {
        [self.n1, self.n2, self.n3, self.n4, self.n5, self.n6]
    }
}

impl TryFrom<DrawRow> for Draw {
    type Error = DrawError;

    fn try_from(row: DrawRow) -> Result<Self, Self::Error> {
        let draw_no = u32::try_from(row.draw_no)
            .ok()
            .filter(|&n| n > 0)
            .ok_or(DrawError::InvalidDrawNo(i64::from(row.draw_no)))?;
        let ball = |value: i32| u8::try_from(value).map_err(|_e| DrawError::NumberOutOfRange(i64::from(value)));
        let numbers = row
            .numbers()
            .into_iter()
            .map(ball)
            .collect::<Result<Vec<_>, _>>()?;
        let bonus =
            u8::try_from(row.bonus).map_err(|_e| DrawError::BonusOutOfRange(i64::from(row.bonus)))?;
        let first_prize_amount = u64::try_from(row.first_prize_amount)
            .map_err(|_e| DrawError::NegativePrize(row.first_prize_amount))?;

        Self::new(draw_no, row.draw_date, numbers, bonus, first_prize_amount)
    }
}
