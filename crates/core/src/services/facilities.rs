//! Floors, wards and beds.
//!
//! The hierarchy is enforced on write: a ward needs an existing floor and a bed an existing
//! ward, and nothing can be deleted while something still hangs off it.

use super::{id_value, ServiceContext};
use crate::models::{
    Bed, BedFilter, BedRequest, BedView, Floor, FloorRequest, Patient, PatientSummary, Ward,
    WardFilter, WardRequest, WardSummary,
};
use crate::pagination::{paginate, PageRequest, Paginated};
use crate::store::{Filter, Query, Sort};
use crate::validation::Validate;
use crate::vocab::BedStatus;
use crate::{HisError, HisResult};
use api_shared::DropdownOption;
use uuid::Uuid;

#[derive(Clone)]
pub struct FacilityService {
    ctx: ServiceContext,
}

impl FacilityService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    // ========================================================================
    // FLOORS
    // ========================================================================

    async fn check_floor_number(&self, number: i32, except: Option<Uuid>) -> HisResult<()> {
        let filter = Filter::all_of(vec![
            Filter::eq("number", number),
            except.map_or(Filter::All, |id| Filter::ne("id", id_value(id))),
        ]);
        if self.ctx.collection::<Floor>().exists(filter).await? {
            return Err(HisError::precondition(format!("Floor number {number} already exists")));
        }
        Ok(())
    }

    pub async fn create_floor(&self, req: FloorRequest) -> HisResult<Floor> {
        req.validate()?;
        self.check_floor_number(req.number, None).await?;
        let floor = Floor::new(req, self.ctx.now());
        self.ctx.collection::<Floor>().insert(&floor).await?;
        Ok(floor)
    }

    pub async fn get_floor(&self, id: Uuid) -> HisResult<Floor> {
        self.ctx.require(id, "Floor").await
    }

    pub async fn list_floors(&self, page: &PageRequest) -> HisResult<Paginated<Floor>> {
        Ok(paginate(&self.ctx.collection::<Floor>(), Filter::All, Sort::asc("number"), page).await?)
    }

    pub async fn update_floor(&self, id: Uuid, req: FloorRequest) -> HisResult<Floor> {
        req.validate()?;
        let mut floor = self.get_floor(id).await?;
        self.check_floor_number(req.number, Some(id)).await?;
        floor.apply(req, self.ctx.now());
        self.ctx.collection::<Floor>().replace(&floor).await?;
        Ok(floor)
    }

    pub async fn delete_floor(&self, id: Uuid) -> HisResult<()> {
        let floor = self.get_floor(id).await?;
        let has_wards = self
            .ctx
            .collection::<Ward>()
            .exists(Filter::eq("floorId", id_value(id)))
            .await?;
        if has_wards {
            return Err(HisError::precondition("Floor has wards and cannot be deleted"));
        }
        self.ctx.collection::<Floor>().delete(floor.id).await?;
        Ok(())
    }

    pub async fn floor_dropdown(&self) -> HisResult<Vec<DropdownOption>> {
        let floors = self
            .ctx
            .collection::<Floor>()
            .find(&Query::new(Filter::All).sort(Sort::asc("number")))
            .await?;
        Ok(floors
            .iter()
            .map(|f| DropdownOption::new(f.id, f.name.as_str()))
            .collect())
    }

    // ========================================================================
    // WARDS
    // ========================================================================

    pub async fn create_ward(&self, req: WardRequest) -> HisResult<Ward> {
        req.validate()?;
        self.get_floor(req.floor_id).await?;
        let ward = Ward::new(req, self.ctx.now());
        self.ctx.collection::<Ward>().insert(&ward).await?;
        Ok(ward)
    }

    pub async fn get_ward(&self, id: Uuid) -> HisResult<Ward> {
        self.ctx.require(id, "Ward").await
    }

    pub async fn list_wards(&self, filter: &WardFilter, page: &PageRequest) -> HisResult<Paginated<Ward>> {
        let predicate = filter
            .floor_id
            .map_or(Filter::All, |id| Filter::eq("floorId", id_value(id)));
        Ok(paginate(&self.ctx.collection::<Ward>(), predicate, Sort::asc("name"), page).await?)
    }

    pub async fn update_ward(&self, id: Uuid, req: WardRequest) -> HisResult<Ward> {
        req.validate()?;
        let mut ward = self.get_ward(id).await?;
        self.get_floor(req.floor_id).await?;
        ward.apply(req, self.ctx.now());
        self.ctx.collection::<Ward>().replace(&ward).await?;
        Ok(ward)
    }

    pub async fn delete_ward(&self, id: Uuid) -> HisResult<()> {
        let ward = self.get_ward(id).await?;
        let has_beds = self
            .ctx
            .collection::<Bed>()
            .exists(Filter::eq("wardId", id_value(id)))
            .await?;
        if has_beds {
            return Err(HisError::precondition("Ward has beds and cannot be deleted"));
        }
        self.ctx.collection::<Ward>().delete(ward.id).await?;
        Ok(())
    }

    pub async fn ward_dropdown(&self, floor_id: Option<Uuid>) -> HisResult<Vec<DropdownOption>> {
        let filter = floor_id.map_or(Filter::All, |id| Filter::eq("floorId", id_value(id)));
        let wards = self
            .ctx
            .collection::<Ward>()
            .find(&Query::new(filter).sort(Sort::asc("name")))
            .await?;
        Ok(wards
            .iter()
            .map(|w| DropdownOption::new(w.id, format!("{} ({})", w.name, w.ward_type.label())))
            .collect())
    }

    // ========================================================================
    // BEDS
    // ========================================================================

    pub async fn create_bed(&self, req: BedRequest) -> HisResult<Bed> {
        req.validate()?;
        self.get_ward(req.ward_id).await?;
        let bed = Bed::new(req, self.ctx.now());
        self.ctx.collection::<Bed>().insert(&bed).await?;
        Ok(bed)
    }

    pub async fn get_bed(&self, id: Uuid) -> HisResult<BedView> {
        let bed: Bed = self.ctx.require(id, "Bed").await?;
        Ok(self.populate(vec![bed]).await?.remove(0))
    }

    async fn populate(&self, beds: Vec<Bed>) -> HisResult<Vec<BedView>> {
        let wards = self
            .ctx
            .collection::<Ward>()
            .get_many(beds.iter().map(|b| b.ward_id))
            .await?;
        let patients = self
            .ctx
            .collection::<Patient>()
            .get_many(beds.iter().filter_map(|b| b.patient_id))
            .await?;
        Ok(beds
            .into_iter()
            .map(|bed| BedView {
                ward: wards.get(&bed.ward_id).map(WardSummary::from),
                patient: bed
                    .patient_id
                    .and_then(|id| patients.get(&id))
                    .map(PatientSummary::from),
                bed,
            })
            .collect())
    }

    pub async fn list_beds(&self, filter: &BedFilter, page: &PageRequest) -> HisResult<Paginated<BedView>> {
        let predicate = Filter::all_of(vec![
            filter
                .ward_id
                .map_or(Filter::All, |id| Filter::eq("wardId", id_value(id))),
            filter
                .status
                .map_or(Filter::All, |s| Filter::eq("status", s.as_str())),
        ]);
        let page = paginate(&self.ctx.collection::<Bed>(), predicate, Sort::asc("bedNumber"), page).await?;
        let items = self.populate(page.items.clone()).await?;
        Ok(page.with_items(items))
    }

    /// # Errors
    ///
    /// Returns `HisError::Precondition` when moving or changing the status of an occupied bed.
    pub async fn update_bed(&self, id: Uuid, req: BedRequest) -> HisResult<Bed> {
        req.validate()?;
        let mut bed: Bed = self.ctx.require(id, "Bed").await?;
        self.get_ward(req.ward_id).await?;
        if bed.status == BedStatus::Occupied && (req.status.is_some() || req.ward_id != bed.ward_id) {
            return Err(HisError::precondition(
                "Bed is occupied; discharge or transfer the patient first",
            ));
        }
        bed.apply(req, self.ctx.now());
        self.ctx.collection::<Bed>().replace(&bed).await?;
        Ok(bed)
    }

    pub async fn delete_bed(&self, id: Uuid) -> HisResult<()> {
        let bed: Bed = self.ctx.require(id, "Bed").await?;
        if bed.status == BedStatus::Occupied {
            return Err(HisError::precondition("Bed is occupied and cannot be deleted"));
        }
        self.ctx.collection::<Bed>().delete(bed.id).await?;
        Ok(())
    }

    /// Available beds, optionally within one ward.
    pub async fn available_bed_dropdown(&self, ward_id: Option<Uuid>) -> HisResult<Vec<DropdownOption>> {
        let filter = Filter::all_of(vec![
            Filter::eq("status", BedStatus::Available.as_str()),
            ward_id.map_or(Filter::All, |id| Filter::eq("wardId", id_value(id))),
        ]);
        let beds = self
            .ctx
            .collection::<Bed>()
            .find(&Query::new(filter).sort(Sort::asc("bedNumber")))
            .await?;
        let wards = self
            .ctx
            .collection::<Ward>()
            .get_many(beds.iter().map(|b| b.ward_id))
            .await?;
        Ok(beds
            .iter()
            .map(|b| {
                let label = match wards.get(&b.ward_id) {
                    Some(ward) => format!("{} / {}", ward.name, b.bed_number),
                    None => b.bed_number.to_string(),
                };
                DropdownOption::new(b.id, label)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{harness, text};
    use crate::vocab::WardType;

    #[tokio::test]
    async fn test_hierarchy_is_enforced() {
        let h = harness();
        let facilities = &h.services.facilities;

        let err = facilities
            .create_ward(WardRequest {
                name: text("General A"),
                floor_id: Uuid::new_v4(),
                ward_type: WardType::General,
                description: None,
            })
            .await
            .expect_err("ward without floor should fail");
        assert_eq!(err.to_string(), "Floor not found");

        let bed = h.bed("B-1", 1200.0).await;
        let ward = facilities.get_ward(bed.ward_id).await.expect("ward should exist");

        let err = facilities.delete_floor(ward.floor_id).await.expect_err("floor has wards");
        assert!(matches!(err, HisError::Precondition(_)));
        let err = facilities.delete_ward(ward.id).await.expect_err("ward has beds");
        assert!(matches!(err, HisError::Precondition(_)));

        facilities.delete_bed(bed.id).await.expect("bed delete should succeed");
        facilities.delete_ward(ward.id).await.expect("ward delete should succeed");
        facilities.delete_floor(ward.floor_id).await.expect("floor delete should succeed");
    }

    #[tokio::test]
    async fn test_duplicate_floor_number_rejected() {
        let h = harness();
        let facilities = &h.services.facilities;
        let req = || FloorRequest {
            name: text("First"),
            number: 1,
            description: None,
        };
        facilities.create_floor(req()).await.expect("create should succeed");
        let err = facilities.create_floor(req()).await.expect_err("duplicate number");
        assert_eq!(err.to_string(), "Floor number 1 already exists");
    }

    #[tokio::test]
    async fn test_occupied_bed_cannot_be_deleted_or_retagged() {
        let h = harness();
        let facilities = &h.services.facilities;
        let mut bed = h.bed("B-1", 1200.0).await;
        bed.occupy(Uuid::new_v4(), h.ctx.now());
        h.ctx.collection::<Bed>().replace(&bed).await.expect("replace should succeed");

        let err = facilities.delete_bed(bed.id).await.expect_err("occupied bed");
        assert!(matches!(err, HisError::Precondition(_)));

        let err = facilities
            .update_bed(
                bed.id,
                BedRequest {
                    bed_number: text("B-1"),
                    ward_id: bed.ward_id,
                    charge_per_day: 1500.0,
                    status: Some(BedStatus::Maintenance),
                },
            )
            .await
            .expect_err("occupied bed status is locked");
        assert!(matches!(err, HisError::Precondition(_)));

        assert!(facilities
            .available_bed_dropdown(None)
            .await
            .expect("dropdown should succeed")
            .is_empty());
    }

    #[tokio::test]
    async fn test_bed_list_filters_by_status() {
        let h = harness();
        let facilities = &h.services.facilities;
        let bed = h.bed("B-1", 1200.0).await;
        h.bed("B-2", 1200.0).await;
        facilities
            .update_bed(
                bed.id,
                BedRequest {
                    bed_number: text("B-1"),
                    ward_id: bed.ward_id,
                    charge_per_day: 1200.0,
                    status: Some(BedStatus::Maintenance),
                },
            )
            .await
            .expect("update should succeed");

        let filter = BedFilter {
            ward_id: None,
            status: Some(BedStatus::Available),
        };
        let page = facilities
            .list_beds(&filter, &PageRequest::default())
            .await
            .expect("list should succeed");
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].bed.bed_number.as_str(), "B-2");
        assert!(page.items[0].ward.is_some());
    }
}
